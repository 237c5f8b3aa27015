//! Port interface for operation and exception notifications

use std::fmt::Debug;

use archivist_domain::ArchiveEvent;
use async_trait::async_trait;

/// Trait for audit/event sinks receiving archive events
///
/// Delivery is fire-and-forget: a sink that cannot record an event should
/// log the failure itself rather than fail the archive operation.
#[async_trait]
pub trait NotificationSink: Send + Sync + Debug {
    /// Record one event
    async fn notify(&self, event: ArchiveEvent);

    /// Check if the sink is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}
