//! # Archivist Infrastructure
//!
//! Implementations of the `archivist-core` ports and the archive client.
//!
//! This crate contains:
//! - The [`ArchiveClient`] and its request engine
//! - HTTP transport (reqwest)
//! - Response caching (moka)
//! - Local attachment storage (tokio fs)
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Implements traits defined in `archivist-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod archive;
pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod storage;

// Re-export commonly used items
pub use archive::{ArchiveClient, ArchiveClientBuilder, TracingNotificationSink};
pub use cache::ResponseCache;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use storage::LocalFileStore;
