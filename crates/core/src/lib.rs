//! # Archivist Core
//!
//! Pure request logic for the document archive client - no HTTP or storage
//! code.
//!
//! This crate contains:
//! - Port interfaces (traits) for the token provider, file store,
//!   notification sink and URL rewriting
//! - Authentication header resolution
//! - Cache key derivation
//! - URL, query string and multipart field construction
//!
//! ## Architecture Principles
//! - Only depends on `archivist-domain`
//! - All external collaborators via traits
//! - Pure, testable logic

pub mod auth;
pub mod cache;
pub mod notification_ports;
pub mod request;
pub mod storage_ports;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::ports::TokenProvider;
pub use auth::{has_allowed_role, AuthHeaders, AuthMode, AuthResolver};
pub use cache::key::{cache_key, transaction_cache_key};
pub use notification_ports::NotificationSink;
pub use request::rewrite::{rewriter_for, HostRewriter, IdentityRewriter, UrlRewriter};
pub use request::{encode_query, form_fields, EndpointBuilder, FormField};
pub use storage_ports::FileStore;
