//! Client configuration structures

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_ATTACHMENT_PREFIX, DEFAULT_MAX_PAGES, DEFAULT_TIMEOUT_SECS,
    LOCAL_ENVIRONMENT,
};
use crate::{ArchiveError, Result};

/// Configuration for the archive client
///
/// Loaded by `archivist_infra::config` from environment variables or a
/// JSON/TOML file. Every field has a default so partial files are accepted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Base URL of the archive (e.g., "https://archive.example.com")
    pub base_url: String,
    /// API version path segment (e.g., "v1")
    pub version: String,
    /// Static service API key sent as `X-Api-Key`
    pub api_key: String,
    /// Owning service name, used to scope transaction-id lookups
    pub service_name: Option<String>,
    /// Roles that always authenticate with the API key
    pub admin_roles: Vec<String>,
    /// Roles that authenticate with a per-user bearer token
    pub user_roles: Vec<String>,
    /// Whether per-user token authentication is enabled
    pub use_token_auth: bool,
    /// Name of the bearer token to request from the token provider
    pub token_name: Option<String>,
    /// Upper bound on pages fetched by one paginated call
    pub max_pages: u32,
    /// Deployment environment name (e.g., "local", "production")
    pub environment: String,
    /// Whether the response cache is used
    pub use_cache: bool,
    /// Optional cache entry lifetime; entries live for the session when unset
    pub cache_ttl_secs: Option<u64>,
    /// HTTP request timeout
    pub timeout_secs: u64,
    /// Hostname substitution applied to pagination links in local environments
    pub local_host_rewrite: Option<HostRewrite>,
    /// Destination prefix handed to the file store for downloaded attachments
    pub attachment_prefix: String,
}

/// Hostname fragment substitution for `next` links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRewrite {
    pub from: String,
    pub to: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            version: DEFAULT_API_VERSION.to_string(),
            api_key: String::new(),
            service_name: None,
            admin_roles: Vec::new(),
            user_roles: Vec::new(),
            use_token_auth: false,
            token_name: None,
            max_pages: DEFAULT_MAX_PAGES,
            environment: String::new(),
            use_cache: false,
            cache_ttl_secs: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            local_host_rewrite: None,
            attachment_prefix: DEFAULT_ATTACHMENT_PREFIX.to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Check invariants that the client relies on.
    ///
    /// # Errors
    /// Returns `ArchiveError::Config` for an empty base URL, an empty version
    /// segment or a zero page bound.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ArchiveError::Config("base_url must not be empty".into()));
        }
        if self.version.trim().is_empty() {
            return Err(ArchiveError::Config("version must not be empty".into()));
        }
        if self.max_pages == 0 {
            return Err(ArchiveError::Config("max_pages must be at least 1".into()));
        }
        Ok(())
    }

    /// True when running against a local development environment.
    pub fn is_local(&self) -> bool {
        self.environment.eq_ignore_ascii_case(LOCAL_ENVIRONMENT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Token name, treating an empty string as unset.
    pub fn token_name(&self) -> Option<&str> {
        self.token_name.as_deref().filter(|name| !name.trim().is_empty())
    }
}

// The API key never reaches the logs.
impl fmt::Debug for ArchiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveConfig")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("service_name", &self.service_name)
            .field("admin_roles", &self.admin_roles)
            .field("user_roles", &self.user_roles)
            .field("use_token_auth", &self.use_token_auth)
            .field("token_name", &self.token_name)
            .field("max_pages", &self.max_pages)
            .field("environment", &self.environment)
            .field("use_cache", &self.use_cache)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("local_host_rewrite", &self.local_host_rewrite)
            .field("attachment_prefix", &self.attachment_prefix)
            .finish()
    }
}
