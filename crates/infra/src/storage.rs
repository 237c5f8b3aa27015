//! Filesystem-backed file store for downloaded attachments

use std::path::{Component, Path, PathBuf};

use archivist_core::FileStore;
use archivist_domain::{ArchiveError, Result, StoredFile};
use async_trait::async_trait;
use tracing::debug;

use crate::errors::InfraError;

/// Writes attachments below a root directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Destinations come from server-supplied filenames; anything that could
    // escape the root is rejected.
    fn resolve(&self, destination: &str) -> Result<PathBuf> {
        let relative = Path::new(destination);
        let safe = relative.components().all(|component| matches!(component, Component::Normal(_)));
        if !safe || destination.trim().is_empty() {
            return Err(ArchiveError::Storage(format!(
                "refusing to write outside the store root: {destination}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn write(&self, bytes: &[u8], destination: &str) -> Result<StoredFile> {
        let path = self.resolve(destination)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }
        tokio::fs::write(&path, bytes).await.map_err(InfraError::from)?;

        debug!(path = %path.display(), size = bytes.len(), "attachment written");

        let filename = path
            .file_name()
            .map_or_else(|| destination.to_string(), |name| name.to_string_lossy().into_owned());

        Ok(StoredFile {
            filename,
            location: path.display().to_string(),
            size: bytes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn writes_and_replaces_files() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.write(b"first", "attachments/report.pdf").await.unwrap();
        let stored = store.write(b"second", "attachments/report.pdf").await.unwrap();

        assert_eq!(stored.filename, "report.pdf");
        assert_eq!(stored.size, 6);
        let on_disk = std::fs::read(dir.path().join("attachments/report.pdf")).unwrap();
        assert_eq!(on_disk, b"second");
    }

    #[tokio::test]
    async fn rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());

        let result = store.write(b"x", "attachments/../../etc/passwd").await;
        assert!(matches!(result, Err(ArchiveError::Storage(_))));
        assert!(store.write(b"x", "/etc/passwd").await.is_err());
    }
}
