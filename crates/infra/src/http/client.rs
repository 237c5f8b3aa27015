use std::time::{Duration, Instant};

use archivist_domain::{ArchiveError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with timeout and optional retry support.
///
/// Archive calls are not retried by default: a second POST of the same
/// document would create a duplicate. Retries are opt-in through
/// [`HttpClientBuilder::max_attempts`] and only ever apply to requests whose
/// body can be cloned.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `ArchiveError::Transport` if the TLS backend fails to
    /// initialise.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder.
    ///
    /// Only transport failures are errors here; every HTTP status, including
    /// 4xx and 5xx, comes back as a response for the caller to classify.
    ///
    /// # Errors
    /// - `ArchiveError::ConnectionFailure` when the archive is unreachable
    /// - `ArchiveError::Transport` for timeouts and other transport failures
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;

            // Streaming bodies (multipart uploads) cannot be cloned; they get
            // exactly one attempt.
            let current = match builder.try_clone() {
                Some(cloned) if !is_last => cloned,
                _ => return self.send_once(builder, attempt + 1).await,
            };

            match self.send_once(current, attempt + 1).await {
                Ok(response) if response.status().is_server_error() => {
                    self.sleep_with_backoff(attempt + 1).await;
                }
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() => {
                    self.sleep_with_backoff(attempt + 1).await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(ArchiveError::transport(None, "http client exhausted retries without producing a result"))
    }

    async fn send_once(&self, builder: RequestBuilder, attempt: usize) -> Result<Response> {
        let request = builder.build().map_err(|err| ArchiveError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(attempt, %method, %url, "sending HTTP request");

        let started = Instant::now();
        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                let elapsed_ms = started.elapsed().as_millis();
                debug!(attempt, %method, %url, %status, elapsed_ms, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(attempt, %method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = u32::try_from(retry_number.saturating_sub(1).min(8)).unwrap_or(8);
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 1,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub const fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns `ArchiveError::Transport` if the reqwest client cannot be
    /// built.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| ArchiveError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}
