//! Reason tags: the closed, application-defined discriminant of an error.

use std::any::Any;
use std::fmt;

/// Why an error occurred.
///
/// A reason is a value from a closed set the application defines, normally a
/// fieldless enum. The core never interprets the variants; it only needs a
/// stable textual name for rendering and a way to hand the concrete value back
/// to the caller for exhaustive matching.
///
/// Enums deriving `strum_macros::IntoStaticStr` can use [`impl_reason!`]
/// instead of writing the impl by hand:
///
/// ```
/// use reasoned_core::{impl_reason, Reason};
/// use strum_macros::IntoStaticStr;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
/// enum Failure {
///     FileNotFound,
///     Timeout,
/// }
/// impl_reason!(Failure);
///
/// assert_eq!(Failure::Timeout.name(), "Timeout");
/// ```
pub trait Reason: Any + fmt::Debug + Send + Sync {
    /// Stable textual name of this reason, e.g. the variant name.
    fn name(&self) -> &'static str;

    /// Upcast used for downcasting back to the concrete reason type.
    fn as_any(&self) -> &dyn Any;

    /// Fully qualified name of the concrete reason type.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Wire representation of this reason.
    ///
    /// `None` means the reason does not support serialization; the serial
    /// boundary then refuses the whole error.
    fn to_serial(&self) -> Option<serde_json::Value> {
        None
    }

    /// Whether `other` is the same reason: same concrete type and name.
    ///
    /// Reasons carrying data should override this to compare the data too.
    fn eq_reason(&self, other: &dyn Reason) -> bool {
        self.type_name() == other.type_name() && self.name() == other.name()
    }
}

impl dyn Reason {
    /// Downcast to the concrete reason type.
    pub fn downcast_ref<R: Reason>(&self) -> Option<&R> {
        self.as_any().downcast_ref::<R>()
    }

    /// Whether the concrete reason type is `R`.
    pub fn is<R: Reason>(&self) -> bool {
        self.as_any().is::<R>()
    }
}

/// Implement [`Reason`] for an enum that derives `strum_macros::IntoStaticStr`.
///
/// The `serializable` form also implements `to_serial` through
/// `serde::Serialize`, so the type must derive it.
#[macro_export]
macro_rules! impl_reason {
    ($ty:ty) => {
        impl $crate::Reason for $ty {
            fn name(&self) -> &'static str {
                <&'static str>::from(self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
    ($ty:ty, serializable) => {
        impl $crate::Reason for $ty {
            fn name(&self) -> &'static str {
                <&'static str>::from(self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn to_serial(&self) -> Option<$crate::serde_json::Value> {
                $crate::serde_json::to_value(self).ok()
            }
        }
    };
}
