//! Archive client
//!
//! Public operations against the document archive: search, fetch, create,
//! patch and delete documents, attachment upload/download/delete, and the
//! GDPR export/delete endpoints. All calls go through the
//! [`RequestEngine`](super::engine::RequestEngine); read calls may be served
//! from the [`ResponseCache`].

use std::sync::Arc;

use archivist_core::{
    cache_key, form_fields, rewriter_for, transaction_cache_key, AuthMode, AuthResolver,
    EndpointBuilder, FileStore, NotificationSink, TokenProvider, UrlRewriter,
};
use archivist_domain::constants::{
    CONTENT_DISPOSITION_HEADER, DOCUMENTS_ENDPOINT, SERVICE_NAME_PARAM, TRANSACTION_ID_PARAM,
    USER_DOCUMENTS_ENDPOINT, USER_ID_FIELD,
};
use archivist_domain::{
    sanitize_content, ArchiveConfig, ArchiveError, ArchiveResponse, Document, OperationKind,
    Result, ResultRow, StoredFile,
};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use super::engine::{EngineParts, RequestBody, RequestEngine, RequestOptions};
use super::notifier::{Notifier, TracingNotificationSink};
use crate::cache::ResponseCache;
use crate::http::HttpClient;
use crate::storage::LocalFileStore;

/// Client for the document archive
///
/// Cheap to clone; clones share the engine and the cache.
#[derive(Clone)]
pub struct ArchiveClient {
    config: Arc<ArchiveConfig>,
    endpoints: EndpointBuilder,
    engine: Arc<RequestEngine>,
    cache: Option<ResponseCache>,
    auth: AuthMode,
}

impl ArchiveClient {
    /// Create a builder for fluent configuration
    pub fn builder(config: ArchiveConfig) -> ArchiveClientBuilder {
        ArchiveClientBuilder::new(config)
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Clone of this client whose calls use `mode` for credentials.
    ///
    /// GDPR operations keep forcing the API key regardless.
    #[must_use]
    pub fn with_auth_mode(&self, mode: AuthMode) -> Self {
        Self { auth: mode, ..self.clone() }
    }

    /// Build an unsaved document from wire values. No request is made.
    ///
    /// # Errors
    /// Returns `ArchiveError::InvalidInput` for malformed values.
    pub fn create_document(&self, values: &Map<String, Value>) -> Result<Document> {
        Document::create(values)
    }

    /// Search documents with the given parameters.
    ///
    /// A `lookfor` map in `params` is sent as one free-text filter but does
    /// not take part in cache keying. Results are cached when caching is
    /// enabled, together with one entry per document keyed by its
    /// transaction id. An empty result is an empty list, not an error.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    #[instrument(skip(self, params))]
    pub async fn search_documents(
        &self,
        params: &Map<String, Value>,
        refetch: bool,
    ) -> Result<Vec<Document>> {
        let key = cache_key(params);

        if let Some(rows) = self.cached(&key, refetch) {
            debug!(key = %key, "search served from cache");
            return Ok(documents(rows));
        }

        let url = self.endpoints.url(DOCUMENTS_ENDPOINT, params);
        let results = match self.send(Method::GET, &url, self.options()).await? {
            ArchiveResponse::Results(results) => results,
            other => {
                debug!(response = ?other, "search returned no result set");
                return Ok(Vec::new());
            }
        };
        warn_undecodable(&results.rows);

        if let Some(cache) = &self.cache {
            cache.set(key, results.rows.clone());
            for document in results.documents() {
                if let Some(transaction_id) = document.transaction_id() {
                    cache.set(
                        transaction_cache_key(transaction_id),
                        vec![ResultRow::Document(document.clone())],
                    );
                }
            }
        }

        self.notifier()
            .operation(OperationKind::Search, Value::Object(params.clone()), results.status)
            .await;

        Ok(results.into_documents())
    }

    /// Whether a document with this transaction id exists for the configured
    /// service.
    ///
    /// Documents cached by earlier searches under their transaction id answer
    /// without a request.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    pub async fn check_document_exists_by_transaction_id(&self, transaction_id: &str) -> Result<bool> {
        let service = self.config.service_name.as_deref();
        let cached = self
            .cached(&transaction_cache_key(transaction_id), false)
            .map(documents)
            .unwrap_or_default();
        let same_service = |document: &Document| match (service, document.service()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        };
        if cached.iter().any(same_service) {
            debug!(transaction_id, "existence answered from cache");
            return Ok(true);
        }

        let mut params = Map::new();
        params.insert(TRANSACTION_ID_PARAM.into(), Value::String(transaction_id.to_string()));
        if let Some(service) = &self.config.service_name {
            params.insert(SERVICE_NAME_PARAM.into(), Value::String(service.clone()));
        }

        Ok(!self.search_documents(&params, false).await?.is_empty())
    }

    /// Every document of a user, optionally filtered by transaction id.
    ///
    /// Always authenticated with the API key. Rows that are not documents
    /// are returned as-is.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    #[instrument(skip(self))]
    pub async fn get_user_documents(
        &self,
        user_id: &str,
        transaction_id: Option<&str>,
    ) -> Result<Vec<ResultRow>> {
        let mut params = Map::new();
        if let Some(transaction_id) = transaction_id.filter(|id| !id.is_empty()) {
            params.insert(TRANSACTION_ID_PARAM.into(), Value::String(transaction_id.to_string()));
        }

        let url = self.endpoints.url(&format!("{USER_DOCUMENTS_ENDPOINT}/{user_id}"), &params);
        let options = RequestOptions::with_auth(AuthMode::ForceApiKey);
        let results = match self.send(Method::GET, &url, options).await? {
            ArchiveResponse::Results(results) => results,
            other => {
                debug!(response = ?other, "user documents returned no result set");
                return Ok(Vec::new());
            }
        };
        warn_undecodable(&results.rows);

        self.notifier()
            .operation(OperationKind::Search, json!({"user_id": user_id}), results.status)
            .await;

        Ok(results.rows)
    }

    /// Fetch one document by id.
    ///
    /// # Errors
    /// `ArchiveError::NotFound` when the archive answers 404 or returns no
    /// rows; `ArchiveError::InvalidInput` when the returned row is not a
    /// valid document; any other classified failure from the engine.
    #[instrument(skip(self))]
    pub async fn get_document(&self, id: &str, refetch: bool) -> Result<Document> {
        let cached = self.cached(id, refetch).and_then(|rows| documents(rows).into_iter().next());
        if let Some(document) = cached {
            return Ok(document);
        }

        let url = self.endpoints.path(&format!("{DOCUMENTS_ENDPOINT}/{id}"));
        let results = self.send(Method::GET, &url, self.options()).await?.into_results();

        let Some(document) = results.documents().next().cloned() else {
            let err = results
                .rows
                .iter()
                .find_map(ResultRow::decode_error)
                .unwrap_or_else(|| ArchiveError::NotFound(id.to_string()));
            return Err(self.notifier().exception(err).await);
        };

        if let Some(cache) = &self.cache {
            cache.set(id, vec![ResultRow::Document(document.clone())]);
        }
        Ok(document)
    }

    /// Save a new document.
    ///
    /// Content is sanitised before sending: HTML tags are stripped and empty
    /// lists become empty objects.
    ///
    /// # Errors
    /// `ArchiveError::Transport` when the archive does not return the
    /// created document; any classified failure from the engine.
    #[instrument(skip(self, document), fields(transaction_id = ?document.transaction_id()))]
    pub async fn post_document(&self, document: &Document) -> Result<Document> {
        let mut payload = document.to_map();
        sanitize_payload(&mut payload);

        let url = self.endpoints.path(DOCUMENTS_ENDPOINT);
        let options = self.options().body(RequestBody::Form(form_fields(&payload)));
        let response = self.send(Method::POST, &url, options).await?;
        let created = self.expect_document(response, "create").await?;

        info!(id = created.id(), "document created");
        self.notifier().operation(OperationKind::Create, json!(created.id()), 201).await;
        Ok(created)
    }

    /// Update fields of an existing document.
    ///
    /// `user_id` is removed from `data`; the archive refuses it on patch.
    /// The cached copies under the id and the transaction id are replaced by
    /// the updated document.
    ///
    /// # Errors
    /// `ArchiveError::Transport` when the archive does not return the
    /// updated document; any classified failure from the engine.
    #[instrument(skip(self, data))]
    pub async fn patch_document(&self, id: &str, data: &Map<String, Value>) -> Result<Document> {
        let mut payload = data.clone();
        payload.remove(USER_ID_FIELD);
        sanitize_payload(&mut payload);

        let url = self.endpoints.path(&format!("{DOCUMENTS_ENDPOINT}/{id}"));
        let options = self.options().body(RequestBody::Form(form_fields(&payload)));
        let response = self.send(Method::PATCH, &url, options).await?;
        let updated = self.expect_document(response, "patch").await?;

        if let Some(cache) = &self.cache {
            let row = vec![ResultRow::Document(updated.clone())];
            if let Some(transaction_id) = updated.transaction_id() {
                cache.set(transaction_cache_key(transaction_id), row.clone());
            }
            cache.set(id, row);
        }

        self.notifier().operation(OperationKind::Patch, json!(id), 200).await;
        Ok(updated)
    }

    /// Delete a document.
    ///
    /// Returns `true` only for a 204 answer; any other success status is a
    /// soft failure and returns `false`.
    ///
    /// # Errors
    /// `ArchiveError::InvalidInput` for unsaved documents; any classified
    /// failure from the engine.
    #[instrument(skip(self, document), fields(id = document.id()))]
    pub async fn delete_document(&self, document: &Document) -> Result<bool> {
        if document.is_new() {
            let err = ArchiveError::InvalidInput("cannot delete a document without an id".into());
            return Err(self.notifier().exception(err).await);
        }

        let url = self.endpoints.path(&format!("{DOCUMENTS_ENDPOINT}/{}", document.id()));
        let deleted = self.delete(&url, self.options(), OperationKind::Delete, json!(document.id())).await?;

        if deleted {
            self.clear_cache(Some(document.id()));
            if let Some(transaction_id) = document.transaction_id() {
                self.clear_cache(Some(&transaction_cache_key(transaction_id)));
            }
        }
        Ok(deleted)
    }

    /// Delete one attachment of a document.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    pub async fn delete_attachment(&self, document_id: &str, attachment_id: &str) -> Result<bool> {
        let url = self
            .endpoints
            .path(&format!("{DOCUMENTS_ENDPOINT}/{document_id}/attachments/{attachment_id}"));
        self.delete(&url, self.options(), OperationKind::DeleteAttachment, json!(url)).await
    }

    /// Delete an attachment by its absolute URL (the `href` of an
    /// attachment record).
    ///
    /// # Errors
    /// Any classified failure from the engine.
    pub async fn delete_attachment_by_url(&self, url: &str) -> Result<bool> {
        self.delete(url, self.options(), OperationKind::DeleteAttachment, json!(url)).await
    }

    /// Delete an attachment by integration id, a server-relative path
    /// appended to the base URL.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    pub async fn delete_attachment_via_integration_id(&self, integration_id: &str) -> Result<bool> {
        let url = self.endpoints.absolute(integration_id);
        self.delete(&url, self.options(), OperationKind::DeleteAttachment, json!(url)).await
    }

    /// Download an attachment into the file store.
    ///
    /// Returns `None` when the response was not an attachment.
    ///
    /// # Errors
    /// Any classified failure from the engine or the file store.
    #[instrument(skip(self))]
    pub async fn get_attachment(&self, url: &str) -> Result<Option<StoredFile>> {
        match self.send(Method::GET, url, self.options()).await? {
            ArchiveResponse::File(file) => Ok(Some(file)),
            other => {
                debug!(response = ?other, "attachment request did not return a file");
                Ok(None)
            }
        }
    }

    /// Upload a file as an attachment of a document.
    ///
    /// Returns `true` when the archive accepted the upload with 200/201.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_attachment(
        &self,
        document_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<bool> {
        let url = self.endpoints.path(&format!("{DOCUMENTS_ENDPOINT}/{document_id}/attachments"));
        let options = self
            .options()
            .header(CONTENT_DISPOSITION_HEADER, format!("attachment; filename=\"{filename}\""))
            .body(RequestBody::File { filename: filename.to_string(), bytes });

        let uploaded = match self.send(Method::POST, &url, options).await? {
            ArchiveResponse::Results(set) => (200..=201).contains(&set.status),
            ArchiveResponse::File(_) | ArchiveResponse::NoContent => true,
            ArchiveResponse::Unhandled(_) => false,
        };

        if uploaded {
            self.notifier()
                .operation(
                    OperationKind::Upload,
                    json!({"document_id": document_id, "filename": filename}),
                    201,
                )
                .await;
        }
        Ok(uploaded)
    }

    /// Export everything the archive holds about a user.
    ///
    /// Always authenticated with the API key.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    #[instrument(skip(self))]
    pub async fn get_gdpr_data(&self, user_id: &str) -> Result<Value> {
        let url = self.endpoints.gdpr(user_id);
        let options = RequestOptions::with_auth(AuthMode::ForceApiKey);
        let results = self.send(Method::GET, &url, options).await?.into_results();
        Ok(results.raw.unwrap_or(Value::Null))
    }

    /// Delete everything the archive holds about a user.
    ///
    /// Always authenticated with the API key. Returns `true` only for 204.
    ///
    /// # Errors
    /// Any classified failure from the engine.
    #[instrument(skip(self))]
    pub async fn delete_gdpr_data(&self, user_id: &str) -> Result<bool> {
        let url = self.endpoints.gdpr(user_id);
        let options = RequestOptions::with_auth(AuthMode::ForceApiKey);
        self.delete(&url, options, OperationKind::GdprDelete, json!({"user_id": user_id})).await
    }

    /// Whether `key` has a live cache entry.
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.as_ref().is_some_and(|cache| cache.is_cached(key))
    }

    /// Drop one cache entry, or all of them when `key` is `None`.
    pub fn clear_cache(&self, key: Option<&str>) {
        if let Some(cache) = &self.cache {
            cache.clear(key);
        }
    }

    fn cached(&self, key: &str, refetch: bool) -> Option<Vec<ResultRow>> {
        if refetch {
            return None;
        }
        self.cache.as_ref()?.get(key)
    }

    fn options(&self) -> RequestOptions {
        RequestOptions::with_auth(self.auth.clone())
    }

    fn notifier(&self) -> &Notifier {
        self.engine.notifier()
    }

    async fn send(&self, method: Method, url: &str, options: RequestOptions) -> Result<ArchiveResponse> {
        self.engine.execute(method, url, options).await
    }

    async fn delete(
        &self,
        url: &str,
        options: RequestOptions,
        operation: OperationKind,
        target: Value,
    ) -> Result<bool> {
        let deleted = matches!(
            self.send(Method::DELETE, url, options).await?,
            ArchiveResponse::NoContent
        );

        if deleted {
            self.notifier().operation(operation, target, 204).await;
        } else {
            debug!(url, "delete answered without 204, reporting failure");
        }
        Ok(deleted)
    }

    async fn expect_document(&self, response: ArchiveResponse, action: &str) -> Result<Document> {
        let status = match &response {
            ArchiveResponse::Results(set) => set.status,
            ArchiveResponse::Unhandled(status) => *status,
            ArchiveResponse::NoContent => 204,
            ArchiveResponse::File(_) => 200,
        };

        match response.into_results().into_documents().into_iter().next() {
            Some(document) => Ok(document),
            None => {
                let err = ArchiveError::transport(
                    Some(status),
                    format!("archive did not return a document for {action}"),
                );
                Err(self.notifier().exception(err).await)
            }
        }
    }
}

/// Builder for [`ArchiveClient`]
pub struct ArchiveClientBuilder {
    config: ArchiveConfig,
    tokens: Option<Arc<dyn TokenProvider>>,
    files: Option<Arc<dyn FileStore>>,
    sink: Option<Arc<dyn NotificationSink>>,
    rewriter: Option<Arc<dyn UrlRewriter>>,
    http: Option<HttpClient>,
}

impl ArchiveClientBuilder {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config, tokens: None, files: None, sink: None, rewriter: None, http: None }
    }

    /// Set the caller identity provider (required)
    #[must_use]
    pub fn token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the attachment store (default: a [`LocalFileStore`] under the
    /// system temp directory)
    #[must_use]
    pub fn file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    /// Set the event sink (default: [`TracingNotificationSink`])
    #[must_use]
    pub fn notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Override the pagination link rewriter (default: derived from config)
    #[must_use]
    pub fn url_rewriter(mut self, rewriter: Arc<dyn UrlRewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Use a preconfigured HTTP client (default: built from config timeout)
    #[must_use]
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the archive client
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Config` if the configuration is invalid or the
    /// token provider is missing.
    pub fn build(self) -> Result<ArchiveClient> {
        self.config.validate()?;
        let tokens =
            self.tokens.ok_or_else(|| ArchiveError::Config("Token provider not set".into()))?;

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder().timeout(self.config.timeout()).build()?,
        };
        let files = self.files.unwrap_or_else(|| {
            Arc::new(LocalFileStore::new(std::env::temp_dir().join("archivist")))
        });
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingNotificationSink));
        let rewriter = self.rewriter.unwrap_or_else(|| rewriter_for(&self.config));

        let engine = RequestEngine::new(EngineParts {
            http,
            auth: AuthResolver::new(&self.config, tokens),
            files,
            rewriter,
            notifier: Notifier::new(sink),
            max_pages: self.config.max_pages,
            attachment_prefix: self.config.attachment_prefix.clone(),
        });

        let cache = self.config.use_cache.then(|| ResponseCache::new(self.config.cache_ttl()));

        info!(
            base_url = %self.config.base_url,
            version = %self.config.version,
            cache = cache.is_some(),
            token_auth = self.config.use_token_auth,
            "archive client configured"
        );

        Ok(ArchiveClient {
            endpoints: EndpointBuilder::from_config(&self.config),
            config: Arc::new(self.config),
            engine: Arc::new(engine),
            cache,
            auth: AuthMode::Resolve,
        })
    }
}

fn warn_undecodable(rows: &[ResultRow]) {
    for (index, row) in rows.iter().enumerate() {
        if let Some(err) = row.decode_error() {
            warn!(index, error = %err, "archive row is not a valid document, skipped");
        }
    }
}

fn documents(rows: Vec<ResultRow>) -> Vec<Document> {
    rows.into_iter().filter_map(ResultRow::into_document).collect()
}

// Only `content` is sanitised; metadata is service-owned and sent verbatim.
fn sanitize_payload(payload: &mut Map<String, Value>) {
    if let Some(content) = payload.get_mut("content") {
        sanitize_content(content);
    }
}
