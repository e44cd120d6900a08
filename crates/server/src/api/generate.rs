use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use filestream_core::MessageId;

use super::AppState;
use crate::error::ServerError;

/// `GET /generate/{message_id}` -- mint a stream link for a message.
///
/// Answers in plain text. Resolution failures are reported with their
/// original message so operators can see why a message has no link.
#[utoipa::path(
    get,
    path = "/generate/{message_id}",
    tag = "Links",
    summary = "Generate a stream link",
    description = "Resolves the file attached to a message and returns a hash-protected stream URL as plain text.",
    params(
        ("message_id" = String, Path, description = "Decimal message identifier")
    ),
    responses(
        (status = 200, description = "Stream URL", body = String, content_type = "text/plain"),
        (status = 400, description = "Message id is not a number", body = String, content_type = "text/plain"),
        (status = 403, description = "Access to the message was denied", body = String, content_type = "text/plain"),
        (status = 404, description = "Message or file not found", body = String, content_type = "text/plain"),
        (status = 502, description = "Backing store failure", body = String, content_type = "text/plain"),
        (status = 503, description = "Worker pool not ready", body = super::schemas::ErrorResponse)
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    // Undecodable segments (`%FF`) are just another kind of bad number.
    let parsed = match path {
        Ok(Path(raw)) => raw.parse::<MessageId>().map_err(|_| raw),
        Err(rejection) => Err(rejection.body_text()),
    };
    let message_id = match parsed {
        Ok(message_id) => message_id,
        Err(input) => {
            debug!(%input, "rejected non-numeric message id");
            return (StatusCode::BAD_REQUEST, "Invalid number").into_response();
        }
    };

    match state.gateway.generate_link(message_id).await {
        Ok(url) => (StatusCode::OK, url).into_response(),
        Err(e) => {
            let err = ServerError::from(e);
            let status = err.status();
            warn!(%message_id, %status, error = %err, "link generation failed");
            (status, err.to_string()).into_response()
        }
    }
}
