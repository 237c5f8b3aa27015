//! In-memory collaborators for tests
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for the integration tests of dependent crates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use archivist_domain::{ArchiveError, ArchiveEvent, Result, StoredFile};
use async_trait::async_trait;

use crate::auth::ports::TokenProvider;
use crate::notification_ports::NotificationSink;
use crate::storage_ports::FileStore;

/// Token provider with fixed roles and tokens
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    roles: Vec<String>,
    tokens: HashMap<String, String>,
    expired: bool,
}

impl StaticTokenProvider {
    pub fn new(roles: &[&str]) -> Self {
        Self { roles: roles.iter().map(ToString::to_string).collect(), ..Self::default() }
    }

    #[must_use]
    pub fn with_token(mut self, name: &str, token: &str) -> Self {
        self.tokens.insert(name.to_string(), token.to_string());
        self
    }

    /// Provider whose session has expired; every call fails.
    pub fn expired() -> Self {
        Self { expired: true, ..Self::default() }
    }

    fn check_session(&self) -> Result<()> {
        if self.expired {
            return Err(ArchiveError::TokenExpired("session token has expired".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn current_caller_roles(&self) -> Result<Vec<String>> {
        self.check_session()?;
        Ok(self.roles.clone())
    }

    async fn access_tokens(&self) -> Result<HashMap<String, String>> {
        self.check_session()?;
        Ok(self.tokens.clone())
    }
}

/// File store keeping written files in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).get(destination).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn write(&self, bytes: &[u8], destination: &str) -> Result<StoredFile> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(destination.to_string(), bytes.to_vec());

        let filename = destination.rsplit('/').next().unwrap_or(destination).to_string();
        Ok(StoredFile { filename, location: destination.to_string(), size: bytes.len() as u64 })
    }
}

/// Sink recording every event it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    events: Arc<Mutex<Vec<ArchiveEvent>>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ArchiveEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn operation_count(&self) -> usize {
        self.events().iter().filter(|event| !event.is_exception()).count()
    }

    pub fn exception_count(&self) -> usize {
        self.events().iter().filter(|event| event.is_exception()).count()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, event: ArchiveEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}
