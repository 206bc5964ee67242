//! Serialization boundary for moving a reasoned error across processes.
//!
//! The wire form carries the reason (through [`Reason::to_serial`]), the
//! situation as rendered text, and the cause chain. The origin is not
//! transported. Rebuilding an error from the wire is not a creation event, so
//! it is never announced to a notifier.

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;

use reasoned_error::{Error, ErrorKind, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Cause, ReasonedError};
use crate::origin::Origin;
use crate::reason::Reason;
use crate::situation::{SituationMap, SituationValue};

/// Wire form of a [`ReasonedError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedError {
    pub reason_type: String,
    pub reason_name: String,
    pub reason: Option<serde_json::Value>,
    #[serde(default)]
    pub situation: Vec<(String, Option<String>)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<SerializedCause>,
}

/// Wire form of a cause: another reasoned error, or the text of any other
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SerializedCause {
    Reasoned(Box<SerializedError>),
    Opaque(String),
}

/// A non-reasoned cause rebuilt from its transported text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCause {
    message: String,
}

impl RemoteCause {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RemoteCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for RemoteCause {}

impl SerializedError {
    /// Same rendering as [`ReasonedError::message`].
    pub fn message(&self) -> String {
        let mut out = format!("reason={}", self.reason_name);
        for (name, value) in &self.situation {
            out.push_str(&format!(", {}={}", name, value.as_deref().unwrap_or("None")));
        }
        match &self.cause {
            Some(SerializedCause::Reasoned(inner)) => {
                out.push_str(&format!(", cause={}", inner.message()))
            }
            Some(SerializedCause::Opaque(text)) => out.push_str(&format!(", cause={}", text)),
            None => {}
        }
        out
    }

    /// Rebuild the error with reasons of type `R`.
    ///
    /// Reasoned causes whose reason type is also `R` are rebuilt the same
    /// way; others come back as a [`RemoteCause`] holding their rendering.
    pub fn into_reasoned<R>(self) -> Result<ReasonedError>
    where
        R: Reason + DeserializeOwned,
    {
        let value = match self.reason {
            Some(serde_json::Value::Null) | None => {
                return Err(Error::invalid_object("reason is null")
                    .with_operation("serial::into_reasoned")
                    .with_context("type", self.reason_type));
            }
            Some(value) => value,
        };

        let reason: R = serde_json::from_value(value).map_err(|e| {
            Error::new(ErrorKind::DeserializationFailed, "reason does not decode")
                .with_operation("serial::into_reasoned")
                .with_context("type", type_name::<R>())
                .set_source(e)
        })?;

        let mut situation = SituationMap::new();
        for (name, value) in self.situation {
            if name.is_empty() {
                return Err(Error::invalid_object("empty situation parameter name")
                    .with_operation("serial::into_reasoned"));
            }
            situation.insert(name, SituationValue::from(value));
        }

        let cause: Option<Cause> = match self.cause {
            None => None,
            Some(SerializedCause::Opaque(text)) => Some(Box::new(RemoteCause::new(text))),
            Some(SerializedCause::Reasoned(inner)) if inner.reason_type == type_name::<R>() => {
                Some(Box::new(inner.into_reasoned::<R>()?))
            }
            Some(SerializedCause::Reasoned(inner)) => {
                Some(Box::new(RemoteCause::new(inner.message())))
            }
        };

        Ok(ReasonedError::assemble(
            Box::new(reason),
            situation,
            cause,
            Origin::unknown(),
        ))
    }
}

impl ReasonedError {
    /// Convert to the wire form.
    ///
    /// Fails with [`ErrorKind::NotSerializable`], naming the reason type, when
    /// this reason or the reason of any reasoned cause is not serializable.
    pub fn to_serialized(&self) -> Result<SerializedError> {
        let reason = self.reason();
        let Some(value) = reason.to_serial() else {
            return Err(Error::not_serializable(reason.type_name())
                .with_operation("serial::to_serialized"));
        };

        let situation = self
            .situation()
            .iter()
            .map(|(name, value)| (name.to_string(), value.render()))
            .collect();

        let cause = match self.cause() {
            None => None,
            Some(cause) => match cause.downcast_ref::<ReasonedError>() {
                Some(inner) => Some(SerializedCause::Reasoned(Box::new(inner.to_serialized()?))),
                None => Some(SerializedCause::Opaque(cause.to_string())),
            },
        };

        Ok(SerializedError {
            reason_type: reason.type_name().to_string(),
            reason_name: reason.name().to_string(),
            reason: Some(value),
            situation,
            cause,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let serialized = self.to_serialized()?;
        serde_json::to_string(&serialized).map_err(|e| {
            Error::new(ErrorKind::SerializationFailed, "json encoding failed")
                .with_operation("serial::to_json")
                .set_source(e)
        })
    }

    /// Rebuild an error encoded by [`to_json`](ReasonedError::to_json).
    pub fn from_json<R>(source: &str) -> Result<ReasonedError>
    where
        R: Reason + DeserializeOwned,
    {
        let serialized: SerializedError = serde_json::from_str(source).map_err(|e| {
            Error::new(ErrorKind::DeserializationFailed, "json decoding failed")
                .with_operation("serial::from_json")
                .set_source(e)
        })?;
        serialized.into_reasoned::<R>()
    }
}
