//! Notification events emitted by the archive client

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::NOTIFICATION_COMPONENT;
use crate::errors::{ArchiveError, ErrorKind};
use crate::impl_domain_status_conversions;

/// Operations reported to the notification sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Search,
    Create,
    Patch,
    Delete,
    Upload,
    DeleteAttachment,
    GdprDelete,
}

impl_domain_status_conversions!(OperationKind {
    Search => "search",
    Create => "create",
    Patch => "patch",
    Delete => "delete",
    Upload => "upload",
    DeleteAttachment => "delete_attachment",
    GdprDelete => "gdpr_delete",
});

/// Event forwarded to a `NotificationSink`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ArchiveEvent {
    /// A completed operation
    Operation {
        operation: OperationKind,
        /// What the operation touched: a document id, URL or query
        target: Value,
        /// HTTP status the archive answered with
        status: u16,
    },
    /// A classified failure
    Exception { kind: ErrorKind, message: String, component: String },
}

impl ArchiveEvent {
    pub fn operation(operation: OperationKind, target: Value, status: u16) -> Self {
        Self::Operation { operation, target, status }
    }

    pub fn exception(error: &ArchiveError) -> Self {
        Self::Exception {
            kind: error.kind(),
            message: error.to_string(),
            component: NOTIFICATION_COMPONENT.to_string(),
        }
    }

    pub const fn is_exception(&self) -> bool {
        matches!(self, Self::Exception { .. })
    }
}
