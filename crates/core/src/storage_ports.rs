//! Port interface for persisting downloaded attachments

use archivist_domain::{Result, StoredFile};
use async_trait::async_trait;

/// Byte sink for attachment downloads
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `bytes` at `destination`, replacing any existing file.
    ///
    /// `destination` is a relative hint such as `attachments/report.pdf`;
    /// the store decides where it actually lands and reports that in the
    /// returned handle.
    async fn write(&self, bytes: &[u8], destination: &str) -> Result<StoredFile>;
}
