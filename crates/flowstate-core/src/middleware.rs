//! Middleware: cross-cutting decorators applied to actions at creation time

use crate::action::{ActionMetadata, ActionPayload, DynAction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// A capability that observes or wraps an action when it is created.
///
/// Implementations return either the same action (after subscribing to it)
/// or a wrapper built with [`DynAction::wrap`]. The payload type is never
/// changed: payloads are forwarded as-is.
pub trait Middleware {
    fn apply(&self, action: DynAction, metadata: &ActionMetadata) -> DynAction;
}

/// Severity used when emitting action log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
}

/// One structured log line describing a trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// RON-serialized [`ActionMetadata`]
    pub metadata: String,
    /// RON-serialized payload
    pub payload: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action {} payload {}", self.metadata, self.payload)
    }
}

/// Destination for [`LogLine`]s
pub type LogSink = Rc<dyn Fn(&LogLine)>;

/// Logs every trigger of every action it is applied to.
///
/// The action is returned unchanged; logging happens in a subscriber.
pub struct ConsoleLoggingMiddleware {
    sink: LogSink,
}

impl ConsoleLoggingMiddleware {
    /// Log through `tracing` at info level
    pub fn new() -> Self {
        Self::with_level(LogLevel::Info)
    }

    /// Log through `tracing` at the given level
    pub fn with_level(level: LogLevel) -> Self {
        Self::with_sink(move |line: &LogLine| match level {
            LogLevel::Trace => tracing::trace!(
                target: "flowstate::action",
                metadata = %line.metadata,
                payload = %line.payload,
                "action triggered"
            ),
            LogLevel::Debug => tracing::debug!(
                target: "flowstate::action",
                metadata = %line.metadata,
                payload = %line.payload,
                "action triggered"
            ),
            LogLevel::Info => tracing::info!(
                target: "flowstate::action",
                metadata = %line.metadata,
                payload = %line.payload,
                "action triggered"
            ),
        })
    }

    /// Send log lines to a custom sink
    pub fn with_sink(sink: impl Fn(&LogLine) + 'static) -> Self {
        Self {
            sink: Rc::new(sink),
        }
    }
}

impl Default for ConsoleLoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for ConsoleLoggingMiddleware {
    fn apply(&self, action: DynAction, metadata: &ActionMetadata) -> DynAction {
        let sink = Rc::clone(&self.sink);
        let metadata = metadata
            .to_ron()
            .unwrap_or_else(|_| format!("{:?}", metadata));
        let _subscription = action.subscribe(move |payload: &dyn ActionPayload| {
            let payload = payload
                .to_ron()
                .unwrap_or_else(|_| format!("{:?}", payload));
            sink(&LogLine {
                metadata: metadata.clone(),
                payload,
            });
        });
        action
    }
}
