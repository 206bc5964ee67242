//! Startup-time registration surface over a [`CreationNotifier`].

use crate::dispatch::DispatchConfig;
use crate::handler::CreationHandler;
use crate::notifier::CreationNotifier;

/// Configures how reasoned error creation is observed.
///
/// Meant to be exercised once while the application boots, before any code
/// path can create a reasoned error:
///
/// ```
/// use reasoned_core::{handler_fn, Configuration, CreationNotifier};
///
/// let notifier = CreationNotifier::new();
/// Configuration::for_notifier(&notifier)
///     .add_sync_handler(handler_fn(|err, _| {
///         assert!(!err.message().is_empty());
///         Ok(())
///     }))
///     .add_async_handler(handler_fn(|_, _| Ok(())))
///     .fix();
/// assert!(notifier.is_fixed());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Configuration<'n> {
    notifier: &'n CreationNotifier,
}

impl Configuration<'static> {
    /// Configuration of the process-wide notifier.
    pub fn global() -> Self {
        Self::for_notifier(CreationNotifier::global())
    }
}

impl<'n> Configuration<'n> {
    pub fn for_notifier(notifier: &'n CreationNotifier) -> Self {
        Self { notifier }
    }

    /// Add a handler executed synchronously right after an error is created.
    /// Handlers run in the order added and stop at the first failure.
    pub fn add_sync_handler<H>(&self, handler: H) -> &Self
    where
        H: CreationHandler + 'static,
    {
        self.notifier.add_sync_handler(handler);
        self
    }

    /// Add a handler executed asynchronously right after an error is created.
    /// A failing handler does not stop the others.
    pub fn add_async_handler<H>(&self, handler: H) -> &Self
    where
        H: CreationHandler + 'static,
    {
        self.notifier.add_async_handler(handler);
        self
    }

    pub fn dispatch(&self, config: DispatchConfig) -> &Self {
        self.notifier.set_dispatch(config);
        self
    }

    /// Freeze the configuration and enable notifications.
    pub fn fix(&self) {
        self.notifier.fix();
    }

    pub fn is_fixed(&self) -> bool {
        self.notifier.is_fixed()
    }
}
