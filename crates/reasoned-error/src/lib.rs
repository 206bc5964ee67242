//! # reasoned-error
//!
//! Failures raised by the reasoned error machinery itself.
//!
//! This is *not* the domain error: application code reports domain failures
//! with `ReasonedError`. The `Error` here describes what went wrong while
//! creating, announcing, configuring or serializing one of those.
//!
//! ## Design
//!
//! - **ErrorKind**: what failed (a creation handler vetoed, a reason was not
//!   serializable, a decoded payload had no reason, ...)
//! - **Operation**: where it failed, e.g. `notifier::notify`
//! - **Context**: ordered key/value pairs that help locate the cause
//! - **Source**: the underlying error, boxed so raw types do not leak
//!
//! ## Usage
//!
//! ```rust
//! use reasoned_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::NotSerializable, "app::Reason")
//!         .with_operation("serial::to_serialized")
//!         .with_context("reason", "Timeout"))
//! }
//! ```

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using the reasoned `Error`.
pub type Result<T> = std::result::Result<T, Error>;
