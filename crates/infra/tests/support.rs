//! Shared harness for archive client integration tests
//!
//! Every test gets its own WireMock server, an in-memory file store and a
//! recording notification sink.

use std::sync::Arc;

use archivist_core::testing::{MemoryFileStore, RecordingNotificationSink, StaticTokenProvider};
use archivist_domain::{ArchiveConfig, Document};
use archivist_infra::ArchiveClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const ADMIN_ROLE: &str = "archive-admin";
pub const USER_ROLE: &str = "archive-user";
pub const TOKEN_NAME: &str = "archive";
pub const USER_TOKEN: &str = "user-token";

pub struct Harness {
    pub server: MockServer,
    pub files: MemoryFileStore,
    pub sink: RecordingNotificationSink,
}

/// Route client logs to the test output; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Harness {
    pub async fn start() -> Self {
        init_tracing();
        Self {
            server: MockServer::start().await,
            files: MemoryFileStore::new(),
            sink: RecordingNotificationSink::new(),
        }
    }

    /// Cache on, token auth off, API version `v1`.
    pub fn config(&self) -> ArchiveConfig {
        ArchiveConfig {
            base_url: self.server.uri(),
            version: "v1".into(),
            api_key: API_KEY.into(),
            service_name: Some("tests".into()),
            admin_roles: vec![ADMIN_ROLE.into()],
            user_roles: vec![USER_ROLE.into()],
            token_name: Some(TOKEN_NAME.into()),
            use_cache: true,
            ..ArchiveConfig::default()
        }
    }

    pub fn client(&self) -> ArchiveClient {
        self.client_with(self.config(), StaticTokenProvider::new(&[ADMIN_ROLE]))
    }

    pub fn client_with(&self, config: ArchiveConfig, tokens: StaticTokenProvider) -> ArchiveClient {
        ArchiveClient::builder(config)
            .token_provider(Arc::new(tokens))
            .file_store(Arc::new(self.files.clone()))
            .notification_sink(Arc::new(self.sink.clone()))
            .build()
            .expect("archive client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server.uri())
    }
}

pub fn document_json(id: &str, transaction_id: &str) -> Value {
    json!({
        "id": id,
        "type": "application",
        "status": {"value": "sent"},
        "transaction_id": transaction_id,
        "user_id": "user-1",
        "service": {"name": "tests"},
        "content": {"name": "Applicant"},
        "metadata": {"channel": "web"},
    })
}

pub fn documents_page(count: usize, start: usize, rows: usize, next: Option<&str>) -> Value {
    let results: Vec<Value> = (start..start + rows)
        .map(|n| document_json(&format!("doc-{n}"), &format!("tx-{n}")))
        .collect();
    json!({"count": count, "next": next, "previous": null, "results": results})
}

pub fn saved_document(id: &str) -> Document {
    Document::from_value(&document_json(id, "tx-saved")).expect("document")
}
