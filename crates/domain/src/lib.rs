//! # Archivist Domain
//!
//! Domain types and models for the document archive client.
//!
//! This crate contains:
//! - The archive document model and its wire (de)serialization
//! - Response, file handle and notification event types
//! - Domain error types and Result definitions
//! - Client configuration structures
//!
//! ## Architecture
//! - No dependencies on other Archivist crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
