//! Request execution engine
//!
//! Performs one logical archive call: resolves credentials, sends the
//! request, follows `next` links for paginated bodies and classifies the
//! outcome into an [`ArchiveResponse`].
//!
//! # Status handling
//!
//! | Status            | Outcome                                        |
//! |-------------------|------------------------------------------------|
//! | 200 / 201         | [`ArchiveResponse::Results`] or `File`          |
//! | 204               | [`ArchiveResponse::NoContent`]                  |
//! | other 1xx-3xx     | [`ArchiveResponse::Unhandled`] (soft failure)   |
//! | 404               | `ArchiveError::NotFound`                        |
//! | other 4xx / 5xx   | `ArchiveError::Transport`                       |
//!
//! Every error is logged and reported to the notification sink before it is
//! returned.

use std::sync::Arc;
use std::time::Instant;

use archivist_core::{AuthMode, AuthResolver, FileStore, FormField, UrlRewriter};
use archivist_domain::constants::CONTENT_DISPOSITION_HEADER;
use archivist_domain::{ArchiveError, ArchiveResponse, Result, ResultRow, ResultSet};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::notifier::Notifier;
use crate::errors::{status_error, InfraError};
use crate::http::HttpClient;

/// Body of an outbound request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Multipart text fields
    Form(Vec<FormField>),
    /// Single multipart file part
    File { filename: String, bytes: Vec<u8> },
}

/// Per-call request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub auth: AuthMode,
    /// Request-specific headers; resolved credentials are merged over them
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn with_auth(auth: AuthMode) -> Self {
        Self { auth, ..Self::default() }
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Collaborators and limits used by [`RequestEngine`]
pub struct EngineParts {
    pub http: HttpClient,
    pub auth: AuthResolver,
    pub files: Arc<dyn FileStore>,
    pub rewriter: Arc<dyn UrlRewriter>,
    pub notifier: Notifier,
    pub max_pages: u32,
    pub attachment_prefix: String,
}

/// Executes archive calls
pub struct RequestEngine {
    http: HttpClient,
    auth: AuthResolver,
    files: Arc<dyn FileStore>,
    rewriter: Arc<dyn UrlRewriter>,
    notifier: Notifier,
    max_pages: u32,
    attachment_prefix: String,
}

/// One decoded JSON page
#[derive(Debug, Default)]
struct Page {
    count: Option<u64>,
    next: Option<String>,
    rows: Vec<Value>,
    raw: Option<Value>,
}

impl RequestEngine {
    pub fn new(parts: EngineParts) -> Self {
        Self {
            http: parts.http,
            auth: parts.auth,
            files: parts.files,
            rewriter: parts.rewriter,
            notifier: parts.notifier,
            max_pages: parts.max_pages.max(1),
            attachment_prefix: parts.attachment_prefix,
        }
    }

    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Execute one logical call, following pagination.
    ///
    /// # Errors
    /// Any classified failure: credential resolution errors, connection
    /// failures, `NotFound` for 404, `Transport` for other error statuses,
    /// or a file store error for attachment downloads.
    #[instrument(skip(self, options), fields(auth = ?options.auth))]
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<ArchiveResponse> {
        match self.run(method, url, options).await {
            Ok(response) => Ok(response),
            Err(err) => Err(self.notifier.exception(err).await),
        }
    }

    async fn run(&self, method: Method, url: &str, options: RequestOptions) -> Result<ArchiveResponse> {
        let credentials = self.auth.resolve(&options.auth).await?;
        let mut headers = options.headers;
        credentials.merge_into(&mut headers);

        let mut url = Url::parse(url)
            .map_err(|e| ArchiveError::InvalidInput(format!("invalid archive URL {url}: {e}")))?;

        let started = Instant::now();
        let mut set: Option<ResultSet> = None;
        let mut pages: u32 = 0;

        loop {
            pages += 1;
            let builder = self.build(method.clone(), url.clone(), &headers, &options.body)?;
            let response = self.http.send(builder).await?;
            let status = response.status();

            if status.is_client_error() || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error(status, &body));
            }

            if status.is_success() {
                if let Some(filename) = attachment_filename(response.headers()) {
                    let bytes = response.bytes().await.map_err(InfraError::from)?;
                    let destination = format!("{}/{filename}", self.attachment_prefix);
                    let stored = self.files.write(&bytes, &destination).await?;
                    debug!(filename = %stored.filename, size = stored.size, "attachment downloaded");
                    return Ok(ArchiveResponse::File(stored));
                }
            }

            match status {
                StatusCode::OK | StatusCode::CREATED => {}
                StatusCode::NO_CONTENT if set.is_none() => return Ok(ArchiveResponse::NoContent),
                StatusCode::NO_CONTENT => break,
                other if set.is_none() => {
                    warn!(status = other.as_u16(), %url, "unhandled archive response status");
                    return Ok(ArchiveResponse::Unhandled(other.as_u16()));
                }
                _ => break,
            }

            let body = response.bytes().await.map_err(InfraError::from)?;
            let page = decode_page(&body);
            let next = page.next.clone();

            let accumulated = set.get_or_insert_with(|| ResultSet {
                status: status.as_u16(),
                count: page.count,
                rows: Vec::new(),
                pages: 0,
                raw: page.raw.clone(),
            });
            accumulated.rows.extend(page.rows.into_iter().map(promote));
            accumulated.pages = pages;

            let Some(count) = page.count else { break };
            if count == accumulated.rows.len() as u64 {
                break;
            }
            let Some(next) = next else { break };
            if pages >= self.max_pages {
                warn!(
                    max_pages = self.max_pages,
                    count,
                    rows = accumulated.rows.len(),
                    "page limit reached before results were complete"
                );
                break;
            }

            let rewritten = self.rewriter.rewrite(&next);
            url = url.join(&rewritten).map_err(|e| {
                ArchiveError::InvalidInput(format!("invalid pagination link {rewritten}: {e}"))
            })?;
        }

        let set = set.unwrap_or_else(|| ResultSet::empty(StatusCode::OK.as_u16()));
        debug!(
            %method,
            pages = set.pages,
            rows = set.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "archive call complete"
        );
        Ok(ArchiveResponse::Results(set))
    }

    fn build(
        &self,
        method: Method,
        url: Url,
        headers: &[(String, String)],
        body: &RequestBody,
    ) -> Result<RequestBuilder> {
        let mut builder = self.http.request(method, url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        Ok(match body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => {
                let form = fields.iter().fold(Form::new(), |form, field| {
                    form.text(field.name.clone(), field.contents.clone())
                });
                builder.multipart(form)
            }
            RequestBody::File { filename, bytes } => {
                let part = Part::bytes(bytes.clone())
                    .file_name(filename.clone())
                    .mime_str("application/octet-stream")
                    .map_err(InfraError::from)?;
                builder.multipart(Form::new().part(filename.clone(), part))
            }
        })
    }
}

/// Filename from `Content-Disposition: attachment; filename="..."`.
///
/// Returns `None` for inline or missing dispositions. Only the last path
/// segment of the filename is kept.
fn attachment_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    let mut parts = value.split(';').map(str::trim);

    if !parts.next()?.eq_ignore_ascii_case("attachment") {
        return None;
    }

    let filename = parts
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .unwrap_or_default();

    let filename = filename.rsplit(['/', '\\']).next().unwrap_or_default().to_string();
    if filename.is_empty() || filename == ".." {
        debug!(header = CONTENT_DISPOSITION_HEADER, "attachment without usable filename");
        return Some("attachment".to_string());
    }
    Some(filename)
}

/// Decode a JSON page; undecodable bodies become an empty page.
fn decode_page(body: &[u8]) -> Page {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Page::default();
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "archive response body is not JSON, treating as empty");
            return Page::default();
        }
    };

    match &value {
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(results)) => Page {
                count: map.get("count").and_then(Value::as_u64),
                next: map
                    .get("next")
                    .and_then(Value::as_str)
                    .filter(|next| !next.trim().is_empty())
                    .map(str::to_string),
                rows: results.clone(),
                raw: Some(value.clone()),
            },
            // A bare object is a single row.
            _ => Page { rows: vec![value.clone()], raw: Some(value), ..Page::default() },
        },
        Value::Array(items) => Page { rows: items.clone(), raw: Some(value.clone()), ..Page::default() },
        _ => Page { raw: Some(value), ..Page::default() },
    }
}

fn promote(row: Value) -> ResultRow {
    if row.is_object() {
        ResultRow::from_value(row)
    } else {
        ResultRow::Raw(row)
    }
}
