//! Error types used throughout the archive client

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impl_domain_status_conversions;

/// Main error type for archive operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum ArchiveError {
    /// The archive could not be reached at all (connect refused, DNS, ...).
    #[error("Failed to connect to archive: {0}")]
    ConnectionFailure(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    /// Token authentication is required but no token name is configured.
    #[error("Token authentication misconfigured: {0}")]
    AuthConfiguration(String),

    /// The identity provider reports that the caller's session has expired.
    #[error("Session token expired: {0}")]
    TokenExpired(String),

    /// The caller has neither an admin nor an archive-user role.
    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Transport error: {message}")]
    Transport { status: Option<u16>, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ArchiveError {
    /// Build a transport error carrying the HTTP status that caused it.
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport { status, message: message.into() }
    }

    /// Stable classification used in logs and notifications.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailure(_) => ErrorKind::ConnectionFailure,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AuthConfiguration(_) => ErrorKind::AuthConfiguration,
            Self::TokenExpired(_) => ErrorKind::TokenExpired,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Config(_) => ErrorKind::Config,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Only connection failures are worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailure(_))
    }

    /// HTTP status attached to the error, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Classification of [`ArchiveError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConnectionFailure,
    NotFound,
    AuthConfiguration,
    TokenExpired,
    Authorization,
    Transport,
    Config,
    InvalidInput,
    Serialization,
    Storage,
}

impl_domain_status_conversions!(ErrorKind {
    ConnectionFailure => "connection_failure",
    NotFound => "not_found",
    AuthConfiguration => "auth_configuration",
    TokenExpired => "token_expired",
    Authorization => "authorization",
    Transport => "transport",
    Config => "config",
    InvalidInput => "invalid_input",
    Serialization => "serialization",
    Storage => "storage",
});

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
