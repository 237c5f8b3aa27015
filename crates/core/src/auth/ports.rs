//! Port interfaces for caller identity
//!
//! The hosting application owns login and session handling; the archive
//! client only asks who the caller is and which bearer tokens they hold.

use std::collections::HashMap;

use archivist_domain::Result;
use async_trait::async_trait;

/// Trait for providing the current caller's roles and access tokens
///
/// Either method may fail with `ArchiveError::TokenExpired`, which callers
/// receive unchanged.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Roles held by the caller of the current operation
    async fn current_caller_roles(&self) -> Result<Vec<String>>;

    /// Named bearer tokens for the current caller
    async fn access_tokens(&self) -> Result<HashMap<String, String>>;
}
