//! Fan-out of error creation events to registered handlers.
//!
//! ```text
//!   Open ──fix()──▶ Fixed
//!    │                │
//!    │ add_*_handler  │ add_*_handler: ignored
//!    │ notify: drop   │ notify: sync handlers inline, async handlers spawned
//! ```
//!
//! Registration and `fix()` serialize on a mutex. `fix()` publishes the final
//! handler lists through a `OnceLock`, so a thread that sees the notifier as
//! fixed also sees the complete lists, and concurrent `notify` calls read them
//! without locking.

use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use parking_lot::Mutex;
use reasoned_error::{Error, Result};

use crate::dispatch::{self, DispatchConfig};
use crate::error::ReasonedError;
use crate::handler::CreationHandler;

static GLOBAL: CreationNotifier = CreationNotifier::new();

/// Handlers accepted while the notifier is open.
struct Registry {
    sync: Vec<Arc<dyn CreationHandler>>,
    asyncs: Vec<Arc<dyn CreationHandler>>,
    dispatch: DispatchConfig,
}

impl Registry {
    const fn new() -> Self {
        Self {
            sync: Vec::new(),
            asyncs: Vec::new(),
            dispatch: DispatchConfig::new(),
        }
    }

    fn into_fixed(self) -> Fixed {
        Fixed {
            sync: self.sync.into(),
            asyncs: self.asyncs.into(),
            dispatch: self.dispatch,
        }
    }
}

/// Read-only handler lists published by `fix()`.
struct Fixed {
    sync: Box<[Arc<dyn CreationHandler>]>,
    asyncs: Arc<[Arc<dyn CreationHandler>]>,
    dispatch: DispatchConfig,
}

/// Owns the synchronous and asynchronous creation handlers and announces
/// every finalized [`ReasonedError`] to them once fixed.
///
/// There is one process-wide instance ([`CreationNotifier::global`]) used by
/// the `ReasonedError` factories; independent instances can be created and
/// injected with [`Builder::on`](crate::Builder::on).
pub struct CreationNotifier {
    registry: Mutex<Option<Registry>>,
    fixed: OnceLock<Fixed>,
}

impl CreationNotifier {
    pub const fn new() -> Self {
        Self {
            registry: parking_lot::const_mutex(Some(Registry::new())),
            fixed: OnceLock::new(),
        }
    }

    /// The process-wide notifier.
    pub fn global() -> &'static CreationNotifier {
        &GLOBAL
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed.get().is_some()
    }

    /// Register a handler run inline, in registration order, on every
    /// creation. Ignored once fixed.
    pub fn add_sync_handler<H>(&self, handler: H)
    where
        H: CreationHandler + 'static,
    {
        match self.registry.lock().as_mut() {
            Some(registry) => registry.sync.push(Arc::new(handler)),
            None => tracing::debug!("notifier already fixed, sync handler ignored"),
        }
    }

    /// Register a handler run off the calling path, in registration order,
    /// on every creation. Ignored once fixed.
    pub fn add_async_handler<H>(&self, handler: H)
    where
        H: CreationHandler + 'static,
    {
        match self.registry.lock().as_mut() {
            Some(registry) => registry.asyncs.push(Arc::new(handler)),
            None => tracing::debug!("notifier already fixed, async handler ignored"),
        }
    }

    /// Choose how asynchronous handlers are dispatched. Ignored once fixed.
    pub fn set_dispatch(&self, config: DispatchConfig) {
        match self.registry.lock().as_mut() {
            Some(registry) => registry.dispatch = config,
            None => tracing::debug!("notifier already fixed, dispatch config ignored"),
        }
    }

    /// Stop accepting registrations and start dispatching. Idempotent.
    pub fn fix(&self) {
        let mut registry = self.registry.lock();
        if let Some(open) = registry.take() {
            tracing::debug!(
                sync = open.sync.len(),
                asyncs = open.asyncs.len(),
                strategy = ?open.dispatch.strategy,
                "creation notifier fixed"
            );
            // Only the thread that took the registry reaches here.
            let _ = self.fixed.set(open.into_fixed());
        }
    }

    pub fn sync_handler_count(&self) -> usize {
        // `fix()` publishes under the registry lock.
        match self.registry.lock().as_ref() {
            Some(open) => open.sync.len(),
            None => self.fixed.get().map_or(0, |fixed| fixed.sync.len()),
        }
    }

    pub fn async_handler_count(&self) -> usize {
        match self.registry.lock().as_ref() {
            Some(open) => open.asyncs.len(),
            None => self.fixed.get().map_or(0, |fixed| fixed.asyncs.len()),
        }
    }

    /// Announce that `err` was created.
    ///
    /// Does nothing while open; the event is dropped, not buffered. Once
    /// fixed, runs the sync handlers inline and stops at the first failure,
    /// which is returned. A panicking sync handler unwinds through this call.
    /// Async handlers are then handed to the dispatch context and this call
    /// returns without waiting for them.
    pub fn notify(&self, err: &ReasonedError) -> Result<()> {
        let Some(fixed) = self.fixed.get() else {
            tracing::trace!(reason = err.reason().name(), "notifier open, creation event dropped");
            return Ok(());
        };

        let at = Utc::now();

        for (index, handler) in fixed.sync.iter().enumerate() {
            if let Err(e) = handler.handle(err, at) {
                return Err(Error::handler_failed(index)
                    .with_operation("notifier::notify")
                    .set_source(e));
            }
        }

        if !fixed.asyncs.is_empty() {
            dispatch::spawn_async(&fixed.dispatch, Arc::clone(&fixed.asyncs), err.clone(), at);
        }

        Ok(())
    }
}

impl Default for CreationNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CreationNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationNotifier")
            .field("fixed", &self.is_fixed())
            .field("sync_handlers", &self.sync_handler_count())
            .field("async_handlers", &self.async_handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::dispatch::DispatchStrategy;
    use crate::handler::{HandlerError, handler_fn};
    use pretty_assertions::assert_eq;
    use reasoned_error::ErrorKind;
    use std::sync::mpsc;
    use std::sync::{Barrier, atomic::AtomicUsize, atomic::Ordering};
    use std::time::Duration;
    use strum_macros::IntoStaticStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
    enum Failure {
        FailToDoSomething,
    }
    crate::impl_reason!(Failure);

    type Log = Arc<Mutex<Vec<String>>>;

    const WAIT: Duration = Duration::from_secs(5);

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into()),
            )
            .with_test_writer()
            .try_init();
    }

    fn recording(log: &Log, tag: &'static str) -> impl CreationHandler + 'static {
        let log = Arc::clone(log);
        handler_fn(move |err, _| {
            log.lock().push(format!("{}:{}", tag, err.reason().name()));
            Ok(())
        })
    }

    fn signalling(log: &Log, tag: &'static str, tx: mpsc::Sender<()>) -> impl CreationHandler + 'static {
        let log = Arc::clone(log);
        handler_fn(move |_, _| {
            log.lock().push(tag.to_string());
            let _ = tx.send(());
            Ok(())
        })
    }

    fn failing(msg: &'static str) -> impl CreationHandler + 'static {
        handler_fn(move |_, _| Err(HandlerError::from(msg)))
    }

    #[test]
    fn registration_lifecycle() {
        init_tracing();
        let notifier = CreationNotifier::new();
        assert!(!notifier.is_fixed());
        assert_eq!(notifier.sync_handler_count(), 0);

        notifier.add_sync_handler(handler_fn(|_, _| Ok(())));
        notifier.add_sync_handler(handler_fn(|_, _| Ok(())));
        notifier.add_async_handler(handler_fn(|_, _| Ok(())));
        assert_eq!(notifier.sync_handler_count(), 2);
        assert_eq!(notifier.async_handler_count(), 1);

        notifier.fix();
        assert!(notifier.is_fixed());

        notifier.add_sync_handler(handler_fn(|_, _| Ok(())));
        notifier.add_async_handler(handler_fn(|_, _| Ok(())));
        assert_eq!(notifier.sync_handler_count(), 2);
        assert_eq!(notifier.async_handler_count(), 1);

        notifier.fix();
        assert!(notifier.is_fixed());
        assert_eq!(notifier.sync_handler_count(), 2);
    }

    #[test]
    fn nothing_runs_before_fix() {
        init_tracing();
        let log: Log = Arc::default();
        let notifier = CreationNotifier::new();
        notifier.add_sync_handler(recording(&log, "sync"));
        notifier.add_async_handler(recording(&log, "async"));

        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);
        std::thread::sleep(Duration::from_millis(50));
        assert!(log.lock().is_empty());

        notifier.fix();
        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);
        assert_eq!(log.lock()[0], "sync:FailToDoSomething");
    }

    #[test]
    fn late_registration_is_never_invoked() {
        init_tracing();
        let log: Log = Arc::default();
        let notifier = CreationNotifier::new();
        notifier.fix();
        notifier.add_sync_handler(recording(&log, "late-sync"));
        notifier.add_async_handler(recording(&log, "late-async"));

        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);
        std::thread::sleep(Duration::from_millis(50));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn sync_in_order_then_async_without_blocking() {
        init_tracing();
        let log: Log = Arc::default();
        let gate = Arc::new(Barrier::new(2));
        let (tx, rx) = mpsc::channel();

        let notifier = CreationNotifier::new();
        notifier.add_sync_handler(recording(&log, "h1"));
        notifier.add_sync_handler(recording(&log, "h2"));
        {
            let gate = Arc::clone(&gate);
            let log = Arc::clone(&log);
            notifier.add_async_handler(handler_fn(move |_, _| {
                gate.wait();
                log.lock().push("h3".to_string());
                Ok(())
            }));
        }
        notifier.add_async_handler(signalling(&log, "h4", tx));
        notifier.fix();

        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);

        // notify returned while h3 is still parked on the gate
        assert_eq!(
            *log.lock(),
            vec!["h1:FailToDoSomething".to_string(), "h2:FailToDoSomething".to_string()]
        );
        gate.wait();

        rx.recv_timeout(WAIT).expect("async handlers ran");
        assert_eq!(
            *log.lock(),
            vec![
                "h1:FailToDoSomething".to_string(),
                "h2:FailToDoSomething".to_string(),
                "h3".to_string(),
                "h4".to_string(),
            ]
        );
    }

    #[test]
    fn handlers_share_one_timestamp() {
        init_tracing();
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();
        let notifier = CreationNotifier::new();
        {
            let stamps = Arc::clone(&stamps);
            notifier.add_sync_handler(handler_fn(move |_, at| {
                stamps.lock().push(at);
                Ok(())
            }));
        }
        {
            let stamps = Arc::clone(&stamps);
            notifier.add_async_handler(handler_fn(move |_, at| {
                stamps.lock().push(at);
                let _ = tx.send(());
                Ok(())
            }));
        }
        notifier.fix();

        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);
        rx.recv_timeout(WAIT).expect("async handler ran");

        let stamps = stamps.lock();
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[0], stamps[1]);
    }

    #[test]
    fn async_failures_are_isolated() {
        init_tracing();
        let log: Log = Arc::default();
        let (tx, rx) = mpsc::channel();
        let notifier = CreationNotifier::new();
        notifier.add_async_handler(recording(&log, "before"));
        notifier.add_async_handler(failing("audit sink down"));
        notifier.add_async_handler(handler_fn(|_, _| -> std::result::Result<(), HandlerError> {
            panic!("observer bug")
        }));
        notifier.add_async_handler(signalling(&log, "after", tx));
        notifier.fix();

        let err = Builder::on(&notifier).try_by(Failure::FailToDoSomething);
        assert!(err.is_ok());

        rx.recv_timeout(WAIT).expect("last async handler ran");
        assert_eq!(
            *log.lock(),
            vec!["before:FailToDoSomething".to_string(), "after".to_string()]
        );
    }

    #[test]
    fn sync_failure_stops_dispatch_and_reaches_creator() {
        init_tracing();
        let log: Log = Arc::default();
        let async_calls = Arc::new(AtomicUsize::new(0));
        let notifier = CreationNotifier::new();
        notifier.add_sync_handler(recording(&log, "first"));
        notifier.add_sync_handler(failing("invariant broken"));
        notifier.add_sync_handler(recording(&log, "third"));
        {
            let async_calls = Arc::clone(&async_calls);
            notifier.add_async_handler(handler_fn(move |_, _| {
                async_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        notifier.fix();

        let err = Builder::on(&notifier)
            .with("k", 1)
            .try_by(Failure::FailToDoSomething)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::HandlerFailed);
        assert_eq!(err.context_value("handler"), Some("1"));
        assert_eq!(err.context_value("error"), Some("reason=FailToDoSomething, k=1"));
        assert_eq!(err.source_ref().unwrap().to_string(), "invariant broken");
        assert_eq!(*log.lock(), vec!["first:FailToDoSomething".to_string()]);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(async_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "reasoned error creation vetoed")]
    fn sync_failure_panics_through_infallible_by() {
        let notifier = CreationNotifier::new();
        notifier.add_sync_handler(failing("veto"));
        notifier.fix();
        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);
    }

    #[test]
    fn sync_failure_vetoes_creation_with_cause() {
        let notifier = CreationNotifier::new();
        notifier.add_sync_handler(failing("no causes allowed"));
        notifier.fix();

        let io = std::io::Error::other("socket closed");
        let err = Builder::on(&notifier)
            .try_by_cause(Failure::FailToDoSomething, io)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::HandlerFailed);
        assert_eq!(err.context_value("handler"), Some("0"));
        assert_eq!(
            err.context_value("error"),
            Some("reason=FailToDoSomething, cause=socket closed")
        );
    }

    #[test]
    fn unspawnable_thread_name_does_not_reach_creator() {
        init_tracing();
        let log: Log = Arc::default();
        let async_calls = Arc::new(AtomicUsize::new(0));
        let notifier = CreationNotifier::new();
        notifier.set_dispatch(DispatchConfig::new().with_thread_name("audit\0x"));
        notifier.add_sync_handler(recording(&log, "sync"));
        {
            let async_calls = Arc::clone(&async_calls);
            notifier.add_async_handler(handler_fn(move |_, _| {
                async_calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        notifier.fix();

        let err = Builder::on(&notifier)
            .try_by(Failure::FailToDoSomething)
            .expect("spawn failure must not veto creation");
        assert!(err.is(&Failure::FailToDoSomething));
        assert_eq!(*log.lock(), vec!["sync:FailToDoSomething".to_string()]);

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(async_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pool_strategy_dispatches() {
        init_tracing();
        let log: Log = Arc::default();
        let (tx, rx) = mpsc::channel();
        let notifier = CreationNotifier::new();
        notifier.set_dispatch(DispatchConfig::new().with_strategy(DispatchStrategy::Pool));
        notifier.add_async_handler(signalling(&log, "pooled", tx));
        notifier.fix();

        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);
        rx.recv_timeout(WAIT).expect("pooled handler ran");
        assert_eq!(*log.lock(), vec!["pooled".to_string()]);
    }

    #[test]
    fn concurrent_notify_after_fix() {
        init_tracing();
        let count = Arc::new(AtomicUsize::new(0));
        let notifier = Arc::new(CreationNotifier::new());
        {
            let count = Arc::clone(&count);
            notifier.add_sync_handler(handler_fn(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        notifier.fix();

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let notifier = Arc::clone(&notifier);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let _ = Builder::on(&notifier).by(Failure::FailToDoSomething);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 200);
    }
}
