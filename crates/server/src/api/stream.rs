use axum::body::Body;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use serde::Deserialize;
use utoipa::IntoParams;

use filestream_core::{MessageId, RangeSpec};

use super::AppState;
use crate::error::ServerError;

/// Query parameters of a stream link.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// Link hash returned by `/generate`.
    pub hash: Option<String>,
}

/// `GET /stream/{file}` -- relay a file behind a verified link.
///
/// `file` is the message id, optionally followed by an extension
/// (`7.mp4`). A single `Range` header is honored; other range forms are
/// ignored and the whole file is sent.
#[utoipa::path(
    get,
    path = "/stream/{file}",
    tag = "Links",
    summary = "Stream a file",
    description = "Verifies the link hash against the file's current metadata and relays its bytes. Supports single byte ranges for seeking.",
    params(
        ("file" = String, Path, description = "Message id followed by an optional extension, e.g. `7.mp4`"),
        StreamQuery
    ),
    responses(
        (status = 200, description = "Whole file", content_type = "application/octet-stream"),
        (status = 206, description = "Requested byte range", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed id or missing hash", body = super::schemas::ErrorResponse),
        (status = 403, description = "Hash does not match", body = super::schemas::ErrorResponse),
        (status = 404, description = "Message or file not found", body = super::schemas::ErrorResponse),
        (status = 416, description = "Range outside the file", body = super::schemas::ErrorResponse),
        (status = 503, description = "Worker pool not ready", body = super::schemas::ErrorResponse)
    )
)]
pub async fn stream(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<StreamQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let Path(file) = path.map_err(|_| ServerError::BadRequest("Invalid number".into()))?;
    let message_id = parse_file_segment(&file)?;
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let hash = query
        .hash
        .filter(|hash| !hash.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing hash".into()))?;
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(RangeSpec::parse);

    let stream = state.gateway.open_stream(message_id, &hash, range).await?;

    let size = stream.metadata.file_size;
    let status = if stream.partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, stream.metadata.content_type())
        .header(header::CONTENT_LENGTH, stream.content_length())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&stream.metadata.file_name),
        );
    if stream.partial
        && let Some(range) = stream.range
    {
        builder = builder.header(header::CONTENT_RANGE, range.content_range(size));
    }

    builder
        .body(Body::from_stream(stream.body))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

/// Extract the message id from `7.mp4`, `7` or `7.anything`.
fn parse_file_segment(file: &str) -> Result<MessageId, ServerError> {
    let id = file.split_once('.').map_or(file, |(id, _)| id);
    id.parse()
        .map_err(|_| ServerError::BadRequest("Invalid number".into()))
}

/// `inline` disposition with a header-safe file name.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("inline; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_segment_accepts_any_extension() {
        assert_eq!(parse_file_segment("7.mp4").unwrap(), MessageId::new(7));
        assert_eq!(parse_file_segment("7").unwrap(), MessageId::new(7));
        assert_eq!(parse_file_segment("7.mkv.part").unwrap(), MessageId::new(7));
        assert!(parse_file_segment("abc.mp4").is_err());
        assert!(parse_file_segment(".mp4").is_err());
    }

    #[test]
    fn disposition_escapes_unsafe_characters() {
        assert_eq!(
            content_disposition("clip.mp4"),
            "inline; filename=\"clip.mp4\""
        );
        assert_eq!(
            content_disposition("my \"best\" clip.mp4"),
            "inline; filename=\"my _best_ clip.mp4\""
        );
        assert_eq!(
            content_disposition("vidéo.mp4"),
            "inline; filename=\"vid_o.mp4\""
        );
    }
}
