//! The creation handler contract.

use chrono::{DateTime, Utc};

use crate::error::ReasonedError;

/// Failure returned by a creation handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Observer invoked whenever a [`ReasonedError`] is finalized.
///
/// `at` is the creation timestamp, shared by every handler notified of the
/// same event. Closures of the right shape implement this trait; wrap them in
/// [`handler_fn`] so their argument types are inferred:
///
/// ```
/// use reasoned_core::{handler_fn, CreationNotifier};
///
/// let notifier = CreationNotifier::new();
/// notifier.add_sync_handler(handler_fn(|err, at| {
///     eprintln!("{} {}", at, err);
///     Ok(())
/// }));
/// ```
pub trait CreationHandler: Send + Sync {
    fn handle(&self, err: &ReasonedError, at: DateTime<Utc>) -> Result<(), HandlerError>;
}

impl<F> CreationHandler for F
where
    F: Fn(&ReasonedError, DateTime<Utc>) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, err: &ReasonedError, at: DateTime<Utc>) -> Result<(), HandlerError> {
        self(err, at)
    }
}

/// Identity helper that pins a closure to the handler signature.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&ReasonedError, DateTime<Utc>) -> Result<(), HandlerError> + Send + Sync,
{
    f
}
