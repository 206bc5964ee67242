use chrono::{DateTime, Utc};
use reasoned_core::{CreationHandler, HandlerError, ReasonedError};
use tracing::Level;

/// Creation handler that emits every reasoned error as a `tracing` event on
/// the `reasoned` target.
///
/// It never fails, so it is safe as a synchronous handler; registering it as
/// an asynchronous one keeps formatting off the creating thread.
#[derive(Debug, Clone, Copy)]
pub struct TracingHandler {
    level: Level,
}

impl TracingHandler {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for TracingHandler {
    fn default() -> Self {
        Self::new(Level::WARN)
    }
}

macro_rules! emit {
    ($macro:ident, $err:expr, $at:expr) => {
        tracing::$macro!(
            target: "reasoned",
            reason = $err.reason().name(),
            origin = %$err.origin(),
            at = %$at,
            "{}",
            $err
        )
    };
}

impl CreationHandler for TracingHandler {
    fn handle(&self, err: &ReasonedError, at: DateTime<Utc>) -> Result<(), HandlerError> {
        if self.level == Level::ERROR {
            emit!(error, err, at);
        } else if self.level == Level::WARN {
            emit!(warn, err, at);
        } else if self.level == Level::INFO {
            emit!(info, err, at);
        } else if self.level == Level::DEBUG {
            emit!(debug, err, at);
        } else {
            emit!(trace, err, at);
        }
        Ok(())
    }
}
