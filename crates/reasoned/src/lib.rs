//! # reasoned
//!
//! Errors identified by a reason and described by their situation.
//!
//! This crate re-exports the public surface of `reasoned-core` together with
//! the failure type of the machinery itself (`FailureError`), and ships a
//! ready-made [`TracingHandler`].
//!
//! ```
//! use reasoned::{impl_reason, Configuration, CreationNotifier, ReasonedError, TracingHandler};
//! use strum_macros::IntoStaticStr;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
//! enum Failure { NoSuchFile }
//! impl_reason!(Failure);
//!
//! let notifier = CreationNotifier::new();
//! Configuration::for_notifier(&notifier)
//!     .add_async_handler(TracingHandler::default())
//!     .fix();
//!
//! let err = ReasonedError::builder_on(&notifier)
//!     .with("path", "/tmp/missing")
//!     .by(Failure::NoSuchFile);
//! assert_eq!(err.to_string(), "reason=NoSuchFile, path=/tmp/missing");
//! ```

mod log;

pub use log::TracingHandler;
pub use reasoned_core::*;
pub use reasoned_error::{Error as FailureError, ErrorKind, Result};
