//! Execution context for asynchronous creation handlers.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use reasoned_error::{Error, Result};
use serde::Deserialize;

use crate::error::ReasonedError;
use crate::handler::CreationHandler;

/// Environment variable selecting the dispatch strategy (`thread` or `pool`).
pub const ENV_DISPATCH: &str = "REASONED_ASYNC_DISPATCH";
/// Environment variable naming the dispatch threads.
pub const ENV_THREAD_NAME: &str = "REASONED_ASYNC_THREAD_NAME";

const DEFAULT_THREAD_NAME: &str = "reasoned-notify";

/// Where asynchronous handlers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// A dedicated OS thread per event.
    #[default]
    Thread,
    /// The rayon global pool.
    Pool,
}

impl DispatchStrategy {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "thread" => Ok(DispatchStrategy::Thread),
            "pool" => Ok(DispatchStrategy::Pool),
            other => Err(Error::config_invalid(
                ENV_DISPATCH,
                format!("unknown dispatch strategy '{}', expected 'thread' or 'pool'", other),
            )),
        }
    }
}

/// How asynchronous creation handlers are dispatched.
///
/// ```toml
/// strategy = "pool"
/// thread_name = "audit-notify"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    pub strategy: DispatchStrategy,
    /// Name given to spawned threads (`Thread` strategy only).
    pub thread_name: Cow<'static, str>,
}

impl DispatchConfig {
    pub const fn new() -> Self {
        Self {
            strategy: DispatchStrategy::Thread,
            thread_name: Cow::Borrowed(DEFAULT_THREAD_NAME),
        }
    }

    pub fn with_strategy(mut self, strategy: DispatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Name for spawned threads. Unlike the parsed forms this is not
    /// validated; a name the OS rejects makes dispatch log and drop events.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Cow::Owned(name.into());
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| {
            Error::new(reasoned_error::ErrorKind::ConfigInvalid, "invalid dispatch config")
                .with_operation("dispatch::from_toml_str")
                .set_source(e)
        })?;
        check_thread_name("thread_name", &config.thread_name)
            .map_err(|e| e.with_operation("dispatch::from_toml_str"))?;
        Ok(config)
    }

    /// Defaults overridden by `REASONED_ASYNC_DISPATCH` and
    /// `REASONED_ASYNC_THREAD_NAME` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();
        if let Some(value) = lookup(ENV_DISPATCH) {
            config.strategy = DispatchStrategy::parse(&value)?;
        }
        if let Some(name) = lookup(ENV_THREAD_NAME) {
            check_thread_name(ENV_THREAD_NAME, &name)?;
            config.thread_name = Cow::Owned(name);
        }
        Ok(config)
    }
}

/// Thread names must be non-blank and free of NUL bytes, which the OS
/// thread API cannot carry.
fn check_thread_name(key: &'static str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::config_invalid(key, "thread name must not be empty"));
    }
    if name.contains('\0') {
        return Err(Error::config_invalid(key, "thread name must not contain NUL bytes"));
    }
    Ok(())
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `handlers` off the calling path. Never fails: a spawn failure is
/// logged and the event is dropped for the async handlers.
#[tracing::instrument(skip_all)]
pub(crate) fn spawn_async(
    config: &DispatchConfig,
    handlers: Arc<[Arc<dyn CreationHandler>]>,
    err: ReasonedError,
    at: DateTime<Utc>,
) {
    let job = move || run_isolated(&handlers, &err, at);
    match config.strategy {
        DispatchStrategy::Thread => {
            // `spawn` panics instead of failing on some names (interior NUL).
            let builder = thread::Builder::new().name(config.thread_name.to_string());
            match panic::catch_unwind(AssertUnwindSafe(move || builder.spawn(job))) {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "failed to spawn async creation handler thread");
                }
                Err(_) => {
                    tracing::warn!(
                        thread_name = %config.thread_name,
                        "async creation handler thread spawn panicked"
                    );
                }
            }
        }
        DispatchStrategy::Pool => rayon::spawn(job),
    }
}

/// Invoke every handler in order; failures and panics are logged and
/// swallowed so later handlers still run.
pub(crate) fn run_isolated(
    handlers: &[Arc<dyn CreationHandler>],
    err: &ReasonedError,
    at: DateTime<Utc>,
) {
    for (index, handler) in handlers.iter().enumerate() {
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(err, at))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(handler = index, error = %e, "async creation handler failed");
            }
            Err(_) => {
                tracing::warn!(handler = index, "async creation handler panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reasoned_error::ErrorKind;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_named_thread() {
        let config = DispatchConfig::default();
        assert_eq!(config.strategy, DispatchStrategy::Thread);
        assert_eq!(config.thread_name, "reasoned-notify");
    }

    #[test]
    fn parses_toml() {
        let config = DispatchConfig::from_toml_str(
            r#"
            strategy = "pool"
            thread_name = "audit"
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy, DispatchStrategy::Pool);
        assert_eq!(config.thread_name, "audit");

        let partial = DispatchConfig::from_toml_str("strategy = \"thread\"").unwrap();
        assert_eq!(partial.thread_name, "reasoned-notify");
    }

    #[test]
    fn rejects_bad_toml() {
        let err = DispatchConfig::from_toml_str("strategy = \"fiber\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = DispatchConfig::from_toml_str("queue_bound = 4").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn env_overrides() {
        let config =
            DispatchConfig::from_lookup(lookup(&[(ENV_DISPATCH, "Pool"), (ENV_THREAD_NAME, "obs")]))
                .unwrap();
        assert_eq!(config.strategy, DispatchStrategy::Pool);
        assert_eq!(config.thread_name, "obs");

        let config = DispatchConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DispatchConfig::new());
    }

    #[test]
    fn env_rejects_unknown_strategy() {
        let err = DispatchConfig::from_lookup(lookup(&[(ENV_DISPATCH, "fiber")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("key"), Some(ENV_DISPATCH));

        let err = DispatchConfig::from_lookup(lookup(&[(ENV_THREAD_NAME, " ")])).unwrap_err();
        assert_eq!(err.context_value("key"), Some(ENV_THREAD_NAME));
    }

    #[test]
    fn rejects_thread_name_with_nul() {
        let err = DispatchConfig::from_toml_str("thread_name = \"audit\\u0000x\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("key"), Some("thread_name"));

        let err =
            DispatchConfig::from_lookup(lookup(&[(ENV_THREAD_NAME, "audit\0x")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("key"), Some(ENV_THREAD_NAME));
    }
}
