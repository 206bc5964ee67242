//! Fluent accumulation of situation parameters before finalization.

use std::any::Any;
use std::fmt;

use crate::error::{Cause, ReasonedError};
use crate::notifier::CreationNotifier;
use crate::origin::Origin;
use crate::reason::Reason;
use crate::situation::{SituationMap, SituationValue};

/// Accumulates situation parameters, then finalizes into a [`ReasonedError`].
///
/// Finalizing consumes the builder, so it cannot be reused afterwards.
///
/// ```
/// use reasoned_core::{impl_reason, Builder, CreationNotifier};
/// use strum_macros::IntoStaticStr;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
/// enum Failure { ReadFailed }
/// impl_reason!(Failure);
///
/// let notifier = CreationNotifier::new();
/// let err = Builder::on(&notifier)
///     .with("path", "/etc/app.toml")
///     .with("attempt", 2)
///     .by(Failure::ReadFailed);
/// assert_eq!(err.message(), "reason=ReadFailed, path=/etc/app.toml, attempt=2");
/// ```
#[must_use = "a builder does nothing until finalized with `by`"]
pub struct Builder<'n> {
    notifier: &'n CreationNotifier,
    situation: SituationMap,
    origin: Option<Origin>,
}

impl Builder<'static> {
    /// A builder announcing to the process-wide notifier.
    pub fn new() -> Self {
        Builder::on(CreationNotifier::global())
    }
}

impl Default for Builder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'n> Builder<'n> {
    /// A builder announcing to `notifier`.
    pub fn on(notifier: &'n CreationNotifier) -> Self {
        Self {
            notifier,
            situation: SituationMap::new(),
            origin: None,
        }
    }

    /// Record a situation parameter. A repeated name keeps its first
    /// position and takes the latest value.
    ///
    /// # Panics
    /// Panics if `name` is empty.
    pub fn with<V>(self, name: impl Into<String>, value: V) -> Self
    where
        V: Any + fmt::Display + Send + Sync,
    {
        self.with_value(name, SituationValue::new(value))
    }

    /// Record a situation parameter named after `key.name()`.
    pub fn with_key<K, V>(self, key: &K, value: V) -> Self
    where
        K: Reason,
        V: Any + fmt::Display + Send + Sync,
    {
        self.with(key.name(), value)
    }

    /// Record a situation parameter whose value is absent.
    pub fn with_absent(self, name: impl Into<String>) -> Self {
        self.with_value(name, SituationValue::absent())
    }

    /// Record a pre-built situation value.
    pub fn with_value(mut self, name: impl Into<String>, value: SituationValue) -> Self {
        self.situation.insert(name, value);
        self
    }

    /// Use `origin` instead of the finalizing caller's location.
    pub fn at(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Finalize with no cause.
    ///
    /// # Panics
    /// Panics when a synchronous creation handler fails.
    #[track_caller]
    pub fn by<R: Reason>(self, reason: R) -> ReasonedError {
        let origin = match self.origin {
            Some(origin) => origin,
            None => Origin::caller(),
        };
        self.finalize_or_panic(Box::new(reason), None, origin)
    }

    /// Finalize with a cause.
    ///
    /// # Panics
    /// Panics when a synchronous creation handler fails.
    #[track_caller]
    pub fn by_cause<R, E>(self, reason: R, cause: E) -> ReasonedError
    where
        R: Reason,
        E: Into<Cause>,
    {
        let origin = match self.origin {
            Some(origin) => origin,
            None => Origin::caller(),
        };
        self.finalize_or_panic(Box::new(reason), Some(cause.into()), origin)
    }

    /// Finalize with no cause, returning a synchronous handler failure.
    #[track_caller]
    pub fn try_by<R: Reason>(self, reason: R) -> reasoned_error::Result<ReasonedError> {
        let origin = match self.origin {
            Some(origin) => origin,
            None => Origin::caller(),
        };
        self.finalize(Box::new(reason), None, origin)
    }

    /// Finalize with a cause, returning a synchronous handler failure.
    #[track_caller]
    pub fn try_by_cause<R, E>(self, reason: R, cause: E) -> reasoned_error::Result<ReasonedError>
    where
        R: Reason,
        E: Into<Cause>,
    {
        let origin = match self.origin {
            Some(origin) => origin,
            None => Origin::caller(),
        };
        self.finalize(Box::new(reason), Some(cause.into()), origin)
    }

    fn finalize(
        self,
        reason: Box<dyn Reason>,
        cause: Option<Cause>,
        origin: Origin,
    ) -> reasoned_error::Result<ReasonedError> {
        let err = ReasonedError::assemble(reason, self.situation, cause, origin);
        match self.notifier.notify(&err) {
            Ok(()) => Ok(err),
            Err(e) => Err(e
                .with_operation("builder::finalize")
                .with_context("error", err.message())),
        }
    }

    fn finalize_or_panic(
        self,
        reason: Box<dyn Reason>,
        cause: Option<Cause>,
        origin: Origin,
    ) -> ReasonedError {
        match self.finalize(reason, cause, origin) {
            Ok(err) => err,
            Err(e) => panic!("reasoned error creation vetoed: {}", e),
        }
    }
}
