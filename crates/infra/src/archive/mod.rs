//! Archive client and request engine

pub mod client;
pub mod engine;
pub mod notifier;

pub use client::{ArchiveClient, ArchiveClientBuilder};
pub use engine::{EngineParts, RequestBody, RequestEngine, RequestOptions};
pub use notifier::{Notifier, TracingNotificationSink};
