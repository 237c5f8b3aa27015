//! Integration tests for document operations against a mocked archive
//!
//! **Coverage:**
//! - Pagination: relative `next` links, page bound, host rewriting
//! - Caching: repeat searches, transaction keys, patch refresh
//! - Create/patch payloads: sanitised content, `user_id` removal
//! - Delete outcomes: 204, soft-failure 200, server error
//! - Operation events

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use archivist_core::testing::StaticTokenProvider;
use archivist_core::transaction_cache_key;
use archivist_domain::{ArchiveConfig, ArchiveError, ArchiveEvent, HostRewrite, OperationKind};
use serde_json::{json, Map, Value};
use support::{document_json, documents_page, saved_document, Harness, ADMIN_ROLE, API_KEY};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, Request, ResponseTemplate};

fn params(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string()))).collect()
}

// ============================================================================
// Search and pagination
// ============================================================================

#[tokio::test]
async fn search_follows_relative_next_link_until_count_is_reached() {
    let harness = Harness::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .and(query_param("type", "application"))
        .and(header("X-Api-Key", API_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(documents_page(15, 0, 10, Some("path/to/next/patch"))),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/path/to/next/patch"))
        .and(header("X-Api-Key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(15, 10, 5, None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let documents = harness
        .client()
        .search_documents(&params(&[("type", "application")]), false)
        .await
        .expect("search");

    assert_eq!(documents.len(), 15);
    assert_eq!(documents[0].id(), "doc-0");
    assert_eq!(documents[14].id(), "doc-14");
}

#[tokio::test]
async fn search_stops_at_page_limit() {
    let harness = Harness::start().await;
    let next = harness.url("/v1/documents/more/");

    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(30, 0, 10, Some(&next))))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/more/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(30, 10, 10, Some(&next))))
        .expect(1)
        .mount(&harness.server)
        .await;

    let config = ArchiveConfig { max_pages: 2, ..harness.config() };
    let client = harness.client_with(config, StaticTokenProvider::new(&[ADMIN_ROLE]));

    let documents = client.search_documents(&Map::new(), false).await.expect("search");

    assert_eq!(documents.len(), 20);
}

#[tokio::test]
async fn next_links_are_rewritten_in_local_environment() {
    let harness = Harness::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(
            4,
            0,
            2,
            Some("http://archive.public.example/v1/documents/page-2/"),
        )))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/page-2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(4, 2, 2, None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let config = ArchiveConfig {
        environment: "local".into(),
        local_host_rewrite: Some(HostRewrite {
            from: "http://archive.public.example".into(),
            to: harness.server.uri(),
        }),
        ..harness.config()
    };
    let client = harness.client_with(config, StaticTokenProvider::new(&[ADMIN_ROLE]));

    let documents = client.search_documents(&Map::new(), false).await.expect("search");
    assert_eq!(documents.len(), 4);
}

#[tokio::test]
async fn empty_search_is_an_empty_list() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 0, "next": null, "results": []})),
        )
        .mount(&harness.server)
        .await;

    let documents = harness.client().search_documents(&Map::new(), false).await.expect("search");
    assert!(documents.is_empty());
}

#[tokio::test]
async fn lookfor_is_sent_as_one_filter() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .and(query_param("lookfor", "name:Jane"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(1, 0, 1, None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let mut search = Map::new();
    search.insert("lookfor".into(), json!({"name": "Jane"}));

    let documents = harness.client().search_documents(&search, false).await.expect("search");
    assert_eq!(documents.len(), 1);
}

// ============================================================================
// Caching and events
// ============================================================================

#[tokio::test]
async fn repeated_search_is_served_from_cache_without_events() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(documents_page(15, 0, 10, Some("path/to/next/patch"))),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/path/to/next/patch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(15, 10, 5, None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let search = params(&[("type", "application")]);

    let first = client.search_documents(&search, false).await.expect("first search");
    let second = client.search_documents(&search, false).await.expect("second search");

    assert_eq!(first, second);
    assert_eq!(harness.sink.operation_count(), 1);
    assert!(client.is_cached(&transaction_cache_key("tx-3")));
}

#[tokio::test]
async fn refetch_bypasses_cache() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(1, 0, 1, None)))
        .expect(2)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    client.search_documents(&Map::new(), false).await.expect("search");
    client.search_documents(&Map::new(), true).await.expect("refetch");

    assert_eq!(harness.sink.operation_count(), 2);
}

#[tokio::test]
async fn get_document_is_cached_by_id() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/doc-7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("doc-7", "tx-7")))
        .expect(1)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let document = client.get_document("doc-7", false).await.expect("get");
    let again = client.get_document("doc-7", false).await.expect("cached get");

    assert_eq!(document.id(), "doc-7");
    assert_eq!(document.status(), Some("sent"));
    assert_eq!(again, document);
    assert!(client.is_cached("doc-7"));

    client.clear_cache(Some("doc-7"));
    assert!(!client.is_cached("doc-7"));
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found."))
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let result = client.get_document("missing", false).await;

    assert!(matches!(result, Err(ArchiveError::NotFound(_))));
    assert_eq!(harness.sink.exception_count(), 1);
    assert!(!client.is_cached("missing"));
}

#[tokio::test]
async fn check_exists_filters_by_transaction_and_service() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .and(query_param("transaction_id", "tx-1"))
        .and(query_param("service_name", "tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(1, 1, 1, None)))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .and(query_param("transaction_id", "tx-unknown"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 0, "next": null, "results": []})),
        )
        .mount(&harness.server)
        .await;

    let client = harness.client();
    assert!(client.check_document_exists_by_transaction_id("tx-1").await.expect("exists"));
    assert!(!client.check_document_exists_by_transaction_id("tx-unknown").await.expect("missing"));
}

#[tokio::test]
async fn user_documents_keep_non_document_rows() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/userdocuments/user-1/"))
        .and(query_param("transaction_id", "tx-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "results": [document_json("doc-1", "tx-1"), "summary"],
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let rows = harness.client().get_user_documents("user-1", Some("tx-1")).await.expect("rows");

    assert_eq!(rows.len(), 2);
    assert!(rows[0].as_document().is_some());
    assert!(rows[1].as_document().is_none());
}

// ============================================================================
// Create and patch
// ============================================================================

#[tokio::test]
async fn post_document_sends_sanitised_form_fields() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/documents/"))
        .and(header("X-Api-Key", API_KEY))
        .and(body_string_contains("name=\"transaction_id\""))
        .and(body_string_contains(r#"{"text":"Bold"}"#))
        .and(|req: &Request| !String::from_utf8_lossy(&req.body).contains("<b>"))
        .respond_with(ResponseTemplate::new(201).set_body_json(document_json("doc-new", "tx-new")))
        .expect(1)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let mut values = Map::new();
    values.insert("type".into(), json!("application"));
    values.insert("transaction_id".into(), json!("tx-new"));
    values.insert("content".into(), json!({"text": "<b>Bold<b>"}));
    let document = client.create_document(&values).expect("document");
    assert!(document.is_new());

    let created = client.post_document(&document).await.expect("post");

    assert_eq!(created.id(), "doc-new");
    assert_eq!(
        harness.sink.events(),
        vec![ArchiveEvent::operation(OperationKind::Create, json!("doc-new"), 201)]
    );
}

#[tokio::test]
async fn post_without_returned_document_is_a_transport_error() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/documents/"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let document = client.create_document(&Map::new()).expect("document");
    let result = client.post_document(&document).await;

    assert!(matches!(result, Err(ArchiveError::Transport { status: Some(202), .. })));
}

#[tokio::test]
async fn patch_drops_user_id_and_refreshes_cache() {
    let harness = Harness::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/documents/doc-1/"))
        .and(body_string_contains("name=\"status\""))
        .and(|req: &Request| !String::from_utf8_lossy(&req.body).contains("name=\"user_id\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json("doc-1", "tx-1")))
        .expect(1)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let mut data = Map::new();
    data.insert("status".into(), json!("handled"));
    data.insert("user_id".into(), json!("someone-else"));

    let updated = client.patch_document("doc-1", &data).await.expect("patch");

    assert_eq!(updated.id(), "doc-1");
    assert!(client.is_cached("doc-1"));
    assert!(client.is_cached(&transaction_cache_key("tx-1")));
    assert_eq!(harness.sink.operation_count(), 1);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_with_no_content_succeeds() {
    let harness = Harness::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/documents/doc-1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    let deleted = harness.client().delete_document(&saved_document("doc-1")).await.expect("delete");

    assert!(deleted);
    assert_eq!(
        harness.sink.events(),
        vec![ArchiveEvent::operation(OperationKind::Delete, json!("doc-1"), 204)]
    );
}

#[tokio::test]
async fn delete_with_unexpected_success_is_a_soft_failure() {
    let harness = Harness::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/documents/doc-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Unexpected 200 in delete"))
        .mount(&harness.server)
        .await;

    let deleted = harness.client().delete_document(&saved_document("doc-1")).await.expect("delete");

    assert!(!deleted);
    assert_eq!(harness.sink.operation_count(), 0);
}

#[tokio::test]
async fn delete_server_error_is_raised() {
    let harness = Harness::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/documents/doc-1/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&harness.server)
        .await;

    let result = harness.client().delete_document(&saved_document("doc-1")).await;

    assert!(matches!(result, Err(ArchiveError::Transport { status: Some(500), .. })));
    assert_eq!(harness.sink.exception_count(), 1);
}

#[tokio::test]
async fn deleting_unsaved_document_is_rejected_without_request() {
    let harness = Harness::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let unsaved = client.create_document(&Map::new()).expect("document");

    let result = client.delete_document(&unsaved).await;
    assert!(matches!(result, Err(ArchiveError::InvalidInput(_))));
}

// ============================================================================
// Decoding failures and soft failures
// ============================================================================

#[tokio::test]
async fn json_content_with_apostrophes_is_decoded() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/doc-1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "doc-1", "content": "{\"applicant\": \"O'Neil\"}"})),
        )
        .mount(&harness.server)
        .await;

    let document = harness.client().get_document("doc-1", false).await.expect("document");

    assert_eq!(document.content().expect("content")["applicant"], "O'Neil");
}

#[tokio::test]
async fn undecodable_document_is_invalid_input_not_missing() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/doc-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1", "content": 42})))
        .mount(&harness.server)
        .await;

    let result = harness.client().get_document("doc-1", false).await;

    assert!(matches!(result, Err(ArchiveError::InvalidInput(_))));
    assert_eq!(harness.sink.exception_count(), 1);
}

#[tokio::test]
async fn search_skips_undecodable_rows_and_keeps_the_rest() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "results": [document_json("doc-1", "tx-1"), {"id": "doc-2", "content": 42}],
        })))
        .mount(&harness.server)
        .await;

    let documents = harness.client().search_documents(&Map::new(), false).await.expect("search");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id(), "doc-1");
}

#[tokio::test]
async fn unhandled_search_status_is_empty_without_event() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    assert!(client.search_documents(&Map::new(), false).await.expect("search").is_empty());
    assert!(client.search_documents(&Map::new(), false).await.expect("not cached").is_empty());

    assert_eq!(harness.sink.operation_count(), 0);
}

// ============================================================================
// Transaction-id cache entries
// ============================================================================

#[tokio::test]
async fn existence_check_uses_entries_cached_by_search() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .and(query_param("type", "application"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(2, 0, 2, None)))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .and(query_param("transaction_id", "tx-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(1, 1, 1, None)))
        .expect(0)
        .mount(&harness.server)
        .await;

    let client = harness.client();
    client.search_documents(&params(&[("type", "application")]), false).await.expect("search");

    assert!(client.check_document_exists_by_transaction_id("tx-1").await.expect("exists"));
}

#[tokio::test]
async fn delete_evicts_transaction_entry() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(documents_page(1, 0, 1, None)))
        .mount(&harness.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/documents/doc-0/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&harness.server)
        .await;

    let client = harness.client();
    let documents = client.search_documents(&Map::new(), false).await.expect("search");
    assert!(client.is_cached(&transaction_cache_key("tx-0")));

    assert!(client.delete_document(&documents[0]).await.expect("delete"));

    assert!(!client.is_cached(&transaction_cache_key("tx-0")));
}
