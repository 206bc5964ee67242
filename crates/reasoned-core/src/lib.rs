//! # reasoned-core
//!
//! An error value that says *why* it happened and *under which
//! circumstances*, instead of carrying a free-form message.
//!
//! - **Reason**: a categorical, cheap-to-compare tag, usually a unit enum
//!   variant ([`Reason`], [`impl_reason!`])
//! - **Situation**: ordered named parameters describing the circumstances
//!   ([`SituationMap`])
//! - **Cause**: an optional underlying error
//! - **Origin**: the module, operation and source location of creation
//!   ([`Origin`])
//!
//! Every finalized error is announced to a [`CreationNotifier`]. Handlers are
//! registered once at startup through [`Configuration`], after which the
//! notifier is fixed and starts dispatching.
//!
//! ```
//! use reasoned_core::{impl_reason, reasoned, ReasonedError};
//! use strum_macros::IntoStaticStr;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
//! enum Failure { IndexOutOfRange }
//! impl_reason!(Failure);
//!
//! fn check(index: usize, len: usize) -> Result<(), ReasonedError> {
//!     if index >= len {
//!         return Err(reasoned!(Failure::IndexOutOfRange, "index" => index, "len" => len));
//!     }
//!     Ok(())
//! }
//!
//! let err = check(4, 3).unwrap_err();
//! assert_eq!(err.message(), "reason=IndexOutOfRange, index=4, len=3");
//! assert_eq!(err.origin().operation(), "check");
//! ```

mod builder;
mod config;
mod dispatch;
mod error;
mod handler;
mod notifier;
pub mod origin;
mod reason;
mod serial;
mod situation;
mod wrap;

pub use builder::Builder;
pub use config::Configuration;
pub use dispatch::{DispatchConfig, DispatchStrategy, ENV_DISPATCH, ENV_THREAD_NAME};
pub use error::{Cause, ReasonedError};
pub use handler::{handler_fn, CreationHandler, HandlerError};
pub use notifier::CreationNotifier;
pub use origin::Origin;
pub use reason::Reason;
pub use serial::{RemoteCause, SerializedCause, SerializedError};
pub use situation::{SituationAny, SituationMap, SituationValue};
pub use wrap::IoErrorExt;

#[doc(hidden)]
pub use serde_json;

/// Create a [`ReasonedError`] announced to the process-wide notifier, with
/// the full [`Origin`] (module and enclosing function included).
///
/// ```text
/// reasoned!(reason)
/// reasoned!(reason, "name" => value, ...)
/// reasoned!(reason, cause = err)
/// reasoned!(reason, "name" => value, ...; cause = err)
/// ```
///
/// # Panics
/// Panics when a synchronous creation handler fails, like
/// [`Builder::by`].
#[macro_export]
macro_rules! reasoned {
    ($reason:expr, cause = $cause:expr $(,)?) => {
        $crate::ReasonedError::builder()
            .at($crate::origin!())
            .by_cause($reason, $cause)
    };
    ($reason:expr $(, $name:expr => $value:expr)* ; cause = $cause:expr) => {
        $crate::ReasonedError::builder()
            $(.with($name, $value))*
            .at($crate::origin!())
            .by_cause($reason, $cause)
    };
    ($reason:expr $(, $name:expr => $value:expr)* $(,)?) => {
        $crate::ReasonedError::builder()
            $(.with($name, $value))*
            .at($crate::origin!())
            .by($reason)
    };
}
