//! Progress events emitted by long-running pipeline stages
//!
//! Sinks are fire-and-forget: emitting never blocks and never fails the
//! stage that emits. A pipeline constructed without a sink emits nothing.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ProgressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One progress report from a pipeline component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Emitting component, e.g. `"search"` or `"discovery"`
    pub component: String,
    pub operation: String,
    pub level: ProgressLevel,
    pub message: String,
    /// Free-form structured context
    pub details: serde_json::Value,
}

impl ProgressEvent {
    pub fn new(
        component: impl Into<String>,
        operation: impl Into<String>,
        level: ProgressLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            operation: operation.into(),
            level,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Receives progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Fans events out to any number of subscribers
///
/// Lossy: a slow subscriber misses events once the channel capacity is
/// exceeded, and events emitted with no subscriber are dropped.
pub struct BroadcastSink {
    sender: broadcast::Sender<ProgressEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl ProgressSink for BroadcastSink {
    fn emit(&self, event: ProgressEvent) {
        // No receivers is not an error for a progress feed
        let _ = self.sender.send(event);
    }
}

/// Writes events to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        match event.level {
            ProgressLevel::Info | ProgressLevel::Success => tracing::info!(
                component = %event.component,
                operation = %event.operation,
                "{}",
                event.message
            ),
            ProgressLevel::Warning => tracing::warn!(
                component = %event.component,
                operation = %event.operation,
                "{}",
                event.message
            ),
            ProgressLevel::Error => tracing::error!(
                component = %event.component,
                operation = %event.operation,
                "{}",
                event.message
            ),
        }
    }
}
