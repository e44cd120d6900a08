use axum::http::StatusCode;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use filestream_gateway::GatewayError;
use filestream_worker::WorkerError;

/// Errors that can occur when running the filestream server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS setup failed.
    #[error("tls error: {0}")]
    Tls(#[from] crate::tls::TlsError),

    /// Worker sessions could not be started.
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// A gateway-level error surfaced through the API.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// The request itself is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The worker pool is not ready to take traffic yet.
    #[error("service is starting up")]
    NotReady,

    /// A response could not be assembled.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Status code for a failed backing-store call.
pub fn worker_status(err: &WorkerError) -> StatusCode {
    match err {
        WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkerError::AccessDenied(_) => StatusCode::FORBIDDEN,
        WorkerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        WorkerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        WorkerError::NoWorkers => StatusCode::SERVICE_UNAVAILABLE,
        WorkerError::Connection(_)
        | WorkerError::InvalidResponse(_)
        | WorkerError::Configuration(_) => StatusCode::BAD_GATEWAY,
    }
}

impl ServerError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) | Self::Io(_) | Self::Tls(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Worker(e) => worker_status(e),
            Self::Gateway(e) => match e {
                GatewayError::Resolution(worker) => worker_status(worker),
                GatewayError::Fetch(worker) => worker_status(worker),
                GatewayError::HashMismatch => StatusCode::FORBIDDEN,
                GatewayError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
                GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        let mut response = (status, axum::Json(body)).into_response();

        if let Self::Gateway(GatewayError::RangeNotSatisfiable { size }) = self
            && let Ok(value) = format!("bytes */{size}").parse::<header::HeaderValue>()
        {
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, header::HeaderValue::from_static("1"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn worker_errors_map_to_statuses() {
        assert_eq!(
            worker_status(&WorkerError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            worker_status(&WorkerError::AccessDenied("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            worker_status(&WorkerError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            worker_status(&WorkerError::Timeout(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            worker_status(&WorkerError::Connection("x".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn hash_mismatch_is_forbidden() {
        let response = ServerError::Gateway(GatewayError::HashMismatch).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unsatisfiable_range_carries_content_range() {
        let response =
            ServerError::Gateway(GatewayError::RangeNotSatisfiable { size: 1024 }).into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1024"
        );
    }

    #[test]
    fn resolution_error_keeps_worker_message() {
        let err = ServerError::Gateway(GatewayError::Resolution(Arc::new(
            WorkerError::NotFound("message 9".into()),
        )));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "not found: message 9");
    }

    #[test]
    fn not_ready_asks_to_retry() {
        let response = ServerError::NotReady.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }
}
