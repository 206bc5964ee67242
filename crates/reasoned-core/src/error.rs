//! The reasoned error value.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::builder::Builder;
use crate::notifier::CreationNotifier;
use crate::origin::Origin;
use crate::reason::Reason;
use crate::situation::{SituationMap, SituationValue};

/// Boxed cause of a reasoned error.
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// An immutable error carrying a reason, situation parameters, an optional
/// cause and the origin it was created at.
///
/// Instances are only created through finalization ([`ReasonedError::by`],
/// [`Builder::by`] and friends, or the `reasoned!` macro), which also
/// announces the creation to the [`CreationNotifier`]. Cloning is cheap and
/// shares the same immutable payload.
///
/// `Display` renders [`message`](ReasonedError::message), so a chain of
/// reasoned causes renders recursively:
///
/// ```text
/// reason=ReadFailed, path=/etc/app.toml, cause=reason=PermissionDenied, uid=1000
/// ```
#[derive(Clone)]
pub struct ReasonedError {
    inner: Arc<Inner>,
}

struct Inner {
    reason: Box<dyn Reason>,
    situation: SituationMap,
    cause: Option<Cause>,
    origin: Origin,
}

// ── Construction ──────────────────────────────────────────────────

impl ReasonedError {
    /// Build the value without announcing it. Finalization goes through the
    /// builder; the serial boundary uses this directly to rebuild errors.
    pub(crate) fn assemble(
        reason: Box<dyn Reason>,
        situation: SituationMap,
        cause: Option<Cause>,
        origin: Origin,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                reason,
                situation,
                cause,
                origin,
            }),
        }
    }

    /// Create an error with no situation and no cause, announced to the
    /// process-wide notifier.
    ///
    /// The recorded [`Origin`] carries file, line and column only; use the
    /// [`reasoned!`](crate::reasoned!) macro to also record the module and
    /// enclosing function.
    ///
    /// # Panics
    /// Panics when a synchronous creation handler fails; use
    /// [`try_by`](ReasonedError::try_by) to observe that as a value.
    #[track_caller]
    pub fn by<R: Reason>(reason: R) -> Self {
        Builder::new().by(reason)
    }

    /// Create an error caused by `cause`, announced to the process-wide
    /// notifier.
    #[track_caller]
    pub fn by_cause<R, E>(reason: R, cause: E) -> Self
    where
        R: Reason,
        E: Into<Cause>,
    {
        Builder::new().by_cause(reason, cause)
    }

    /// Like [`by`](ReasonedError::by), but returns a synchronous handler
    /// failure instead of panicking.
    #[track_caller]
    pub fn try_by<R: Reason>(reason: R) -> reasoned_error::Result<Self> {
        Builder::new().try_by(reason)
    }

    #[track_caller]
    pub fn try_by_cause<R, E>(reason: R, cause: E) -> reasoned_error::Result<Self>
    where
        R: Reason,
        E: Into<Cause>,
    {
        Builder::new().try_by_cause(reason, cause)
    }

    /// Start a builder targeting the process-wide notifier with one
    /// situation parameter.
    pub fn with<V>(name: impl Into<String>, value: V) -> Builder<'static>
    where
        V: Any + fmt::Display + Send + Sync,
    {
        Builder::new().with(name, value)
    }

    /// Start a builder keyed by a reason-like value's name.
    pub fn with_key<K, V>(key: &K, value: V) -> Builder<'static>
    where
        K: Reason,
        V: Any + fmt::Display + Send + Sync,
    {
        Builder::new().with_key(key, value)
    }

    /// Start an empty builder targeting the process-wide notifier.
    pub fn builder() -> Builder<'static> {
        Builder::new()
    }

    /// Start an empty builder targeting `notifier`.
    pub fn builder_on(notifier: &CreationNotifier) -> Builder<'_> {
        Builder::on(notifier)
    }
}

// ── Accessors ─────────────────────────────────────────────────────

impl ReasonedError {
    pub fn reason(&self) -> &dyn Reason {
        self.inner.reason.as_ref()
    }

    /// The reason as its concrete type, for exhaustive matching.
    pub fn reason_as<R: Reason>(&self) -> Option<&R> {
        self.reason().downcast_ref::<R>()
    }

    /// Whether this error was raised for exactly `reason`.
    pub fn is<R: Reason + PartialEq>(&self, reason: &R) -> bool {
        self.reason_as::<R>() == Some(reason)
    }

    pub fn situation(&self) -> &SituationMap {
        &self.inner.situation
    }

    /// Typed situation lookup; `None` when missing, absent or mistyped.
    pub fn situation_value<T: Any>(&self, name: &str) -> Option<&T> {
        self.inner.situation.get_as::<T>(name)
    }

    /// Typed situation lookup using `key.name()` as the parameter name.
    pub fn situation_value_for<T: Any, K: Reason>(&self, key: &K) -> Option<&T> {
        self.situation_value::<T>(key.name())
    }

    /// Untyped situation lookup.
    pub fn situation_entry(&self, name: &str) -> Option<&SituationValue> {
        self.inner.situation.get(name)
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.inner.cause.as_deref()
    }

    /// The cause as a concrete error type.
    pub fn cause_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause()?.downcast_ref::<E>()
    }

    pub fn origin(&self) -> &Origin {
        &self.inner.origin
    }

    /// Deterministic rendering:
    /// `reason=<name>[, <name>=<value>]*[, cause=<cause>]`.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Iterate this error and every reasoned error down its cause chain.
    pub fn chain(&self) -> impl Iterator<Item = &ReasonedError> {
        std::iter::successors(Some(self), |err| err.cause_as::<ReasonedError>())
    }

    /// Whether `a` and `b` share the same payload (clones of one creation).
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

// ── std::error::Error ─────────────────────────────────────────────

impl StdError for ReasonedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// ── Display ───────────────────────────────────────────────────────

impl fmt::Display for ReasonedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reason={}", self.inner.reason.name())?;
        for (name, value) in self.inner.situation.iter() {
            write!(f, ", {}={}", name, value)?;
        }
        if let Some(cause) = &self.inner.cause {
            write!(f, ", cause={}", cause)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ReasonedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.inner.reason.name(), self.inner.reason.type_name())?;
        writeln!(f, "    Origin: {}", self.inner.origin)?;

        if !self.inner.situation.is_empty() {
            writeln!(f, "    Situation:")?;
            for (name, value) in self.inner.situation.iter() {
                writeln!(f, "        {}: {}", name, value)?;
            }
        }

        if let Some(cause) = &self.inner.cause {
            writeln!(f, "    Cause: {}", cause)?;
        }

        Ok(())
    }
}
