//! Error kinds for reasoned error operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of failure that occurred.
///
/// Callers match on `ErrorKind` to tell a handler veto apart from a
/// serialization problem or a bad configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Invalid configuration value
    ConfigInvalid,

    // =========================================================================
    // Notification errors
    // =========================================================================
    /// A synchronous creation handler returned a failure
    HandlerFailed,

    // =========================================================================
    // Serialization errors
    // =========================================================================
    /// The reason of an error cannot be serialized
    NotSerializable,

    /// A deserialized payload does not describe a valid error
    InvalidObject,

    /// Encoding to the wire format failed
    SerializationFailed,

    /// Decoding from the wire format failed
    DeserializationFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Whether this kind belongs to the serialization boundary.
    pub fn is_serial(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotSerializable
                | ErrorKind::InvalidObject
                | ErrorKind::SerializationFailed
                | ErrorKind::DeserializationFailed
        )
    }
}
