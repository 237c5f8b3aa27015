//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use archivist_domain::ArchiveError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct InfraError(pub ArchiveError);

impl From<InfraError> for ArchiveError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ArchiveError> for InfraError {
    fn from(value: ArchiveError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoArchiveError {
    fn into_archive(self) -> ArchiveError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ArchiveError */
/* -------------------------------------------------------------------------- */

impl IntoArchiveError for HttpError {
    fn into_archive(self) -> ArchiveError {
        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ArchiveError::ConnectionFailure(self.to_string());
        }

        if self.is_timeout() {
            return ArchiveError::transport(None, "HTTP request timed out");
        }

        if let Some(status) = self.status() {
            return status_error(status, &self.to_string());
        }

        ArchiveError::transport(None, self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_archive())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → ArchiveError */
/* -------------------------------------------------------------------------- */

impl IntoArchiveError for IoError {
    fn into_archive(self) -> ArchiveError {
        ArchiveError::Storage(format!("{:?}: {self}", self.kind()))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_archive())
    }
}

/* -------------------------------------------------------------------------- */
/* Error statuses */
/* -------------------------------------------------------------------------- */

/// Classify an error-range response status.
///
/// 404 means the requested document does not exist; every other status is a
/// transport error carrying the status and the (possibly truncated) body.
pub fn status_error(status: StatusCode, body: &str) -> ArchiveError {
    const MAX_BODY: usize = 512;

    let code = status.as_u16();
    if status == StatusCode::NOT_FOUND {
        return ArchiveError::NotFound("Document not found".into());
    }

    let reason = status.canonical_reason().unwrap_or("unknown status");
    let mut message = format!("HTTP {code} {reason}");
    let body = body.trim();
    if !body.is_empty() {
        let snippet: String = body.chars().take(MAX_BODY).collect();
        message.push_str(": ");
        message.push_str(&snippet);
    }
    ArchiveError::transport(Some(code), message)
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn not_found_status_maps_to_not_found() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "missing"),
            ArchiveError::NotFound(_)
        ));
    }

    #[test]
    fn server_error_keeps_status_and_body() {
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, "Fake connection error") {
            ArchiveError::Transport { status, message } => {
                assert_eq!(status, Some(500));
                assert!(message.contains("Fake connection error"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn io_error_maps_to_storage() {
        let err = IoError::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let mapped: ArchiveError = InfraError::from(err).into();
        assert!(matches!(mapped, ArchiveError::Storage(msg) if msg.contains("read-only")));
    }

    #[tokio::test]
    async fn http_status_401_maps_to_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: ArchiveError = InfraError::from(error).into();
        assert_eq!(mapped.status(), Some(401));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: ArchiveError = InfraError::from(error).into();
        assert!(mapped.is_retryable());
    }
}
