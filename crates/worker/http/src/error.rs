use std::time::Duration;

use filestream_worker::WorkerError;
use thiserror::Error;

/// Errors specific to the HTTP bridge backend.
///
/// Converted into [`WorkerError`] at the trait boundary.
#[derive(Debug, Error)]
pub enum HttpBridgeError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The bridge returned a non-success status code.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The bridge answered with a body we could not decode.
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// The base URL cannot be used to build request URLs.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl From<HttpBridgeError> for WorkerError {
    fn from(err: HttpBridgeError) -> Self {
        match err {
            HttpBridgeError::Http(e) => WorkerError::Connection(e.to_string()),
            HttpBridgeError::Timeout(d) => WorkerError::Timeout(d),
            HttpBridgeError::UnexpectedStatus { status, body } => match status {
                404 => WorkerError::NotFound(body),
                401 | 403 => WorkerError::AccessDenied(body),
                429 => WorkerError::RateLimited,
                500..=599 => WorkerError::Connection(format!("HTTP {status}: {body}")),
                _ => WorkerError::InvalidResponse(format!("HTTP {status}: {body}")),
            },
            HttpBridgeError::InvalidBody(msg) => WorkerError::InvalidResponse(msg),
            HttpBridgeError::InvalidUrl(msg) => WorkerError::Configuration(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> WorkerError {
        HttpBridgeError::UnexpectedStatus {
            status,
            body: "body".into(),
        }
        .into()
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status(404), WorkerError::NotFound(_)));
        assert!(matches!(status(401), WorkerError::AccessDenied(_)));
        assert!(matches!(status(403), WorkerError::AccessDenied(_)));
        assert!(matches!(status(429), WorkerError::RateLimited));
        assert!(matches!(status(503), WorkerError::Connection(_)));
        assert!(matches!(status(418), WorkerError::InvalidResponse(_)));
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(status(502).is_retryable());
        assert!(!status(404).is_retryable());
    }

    #[test]
    fn timeout_maps_to_timeout() {
        let err: WorkerError = HttpBridgeError::Timeout(Duration::from_secs(3)).into();
        assert!(matches!(err, WorkerError::Timeout(d) if d == Duration::from_secs(3)));
    }

    #[test]
    fn invalid_url_is_configuration() {
        let err: WorkerError = HttpBridgeError::InvalidUrl("nope".into()).into();
        assert!(matches!(err, WorkerError::Configuration(_)));
    }

    #[test]
    fn error_display() {
        let err = HttpBridgeError::UnexpectedStatus {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "unexpected status 503: unavailable");
    }
}
