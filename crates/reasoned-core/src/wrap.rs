//! Carrying a reasoned error through call sites bound to `std::io::Error`.
//!
//! Trait impls such as `Read`/`Write` cannot return a `ReasonedError`. The
//! error is wrapped as the sole inner error of an `io::Error` and unwrapped
//! explicitly on the other side.

use std::io;

use crate::error::ReasonedError;

impl ReasonedError {
    /// Wrap into an `io::Error` of kind `Other`.
    pub fn into_io_error(self) -> io::Error {
        io::Error::other(self)
    }
}

impl From<ReasonedError> for io::Error {
    fn from(err: ReasonedError) -> Self {
        err.into_io_error()
    }
}

/// Unwrapping of `io::Error`s produced by [`ReasonedError::into_io_error`].
pub trait IoErrorExt: Sized {
    /// Whether the inner error is a `ReasonedError`.
    fn is_reasoned(&self) -> bool;

    /// Borrow the wrapped `ReasonedError`, if any.
    fn as_reasoned(&self) -> Option<&ReasonedError>;

    /// Take the wrapped `ReasonedError` back out.
    ///
    /// # Panics
    /// Panics if this error does not carry a `ReasonedError`; that is a
    /// programming error on the unwrapping side.
    fn into_reasoned(self) -> ReasonedError;

    /// Take the wrapped `ReasonedError`, or give the `io::Error` back.
    fn try_into_reasoned(self) -> Result<ReasonedError, io::Error>;
}

impl IoErrorExt for io::Error {
    fn is_reasoned(&self) -> bool {
        self.as_reasoned().is_some()
    }

    fn as_reasoned(&self) -> Option<&ReasonedError> {
        self.get_ref()?.downcast_ref::<ReasonedError>()
    }

    fn into_reasoned(self) -> ReasonedError {
        match self.try_into_reasoned() {
            Ok(err) => err,
            Err(other) => panic!("io::Error does not wrap a ReasonedError: {}", other),
        }
    }

    fn try_into_reasoned(self) -> Result<ReasonedError, io::Error> {
        if !self.is_reasoned() {
            return Err(self);
        }
        match self.into_inner().map(|inner| inner.downcast::<ReasonedError>()) {
            Some(Ok(err)) => Ok(*err),
            // checked above
            Some(Err(inner)) => Err(io::Error::other(inner)),
            None => Err(io::Error::other("io::Error without inner error")),
        }
    }
}
