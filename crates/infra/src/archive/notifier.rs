//! Failure classification logging and event delivery

use std::sync::Arc;

use archivist_core::NotificationSink;
use archivist_domain::{ArchiveError, ArchiveEvent, OperationKind};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

/// Logs classified failures and forwards events to the configured sink
#[derive(Debug, Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Report a completed operation.
    pub async fn operation(&self, operation: OperationKind, target: Value, status: u16) {
        if self.sink.is_enabled() {
            self.sink.notify(ArchiveEvent::operation(operation, target, status)).await;
        }
    }

    /// Log and report a classified failure, handing the error back so call
    /// sites can `return Err(notifier.exception(err).await)`.
    pub async fn exception(&self, err: ArchiveError) -> ArchiveError {
        match &err {
            ArchiveError::NotFound(_) => warn!(kind = %err.kind(), error = %err, "archive call failed"),
            _ => error!(kind = %err.kind(), error = %err, "archive call failed"),
        }

        if self.sink.is_enabled() {
            self.sink.notify(ArchiveEvent::exception(&err)).await;
        }
        err
    }
}

/// Sink that writes events to the `tracing` log
///
/// Used when the host application has no audit sink of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, event: ArchiveEvent) {
        match event {
            ArchiveEvent::Operation { operation, target, status } => {
                info!(%operation, %target, status, "archive operation");
            }
            ArchiveEvent::Exception { kind, message, component } => {
                info!(%kind, %component, message = %message, "archive exception");
            }
        }
    }
}
