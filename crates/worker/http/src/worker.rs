use futures::StreamExt;
use reqwest::{Client, StatusCode, Url, header};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use filestream_core::{ByteRange, FileMetadata, MessageId, RemoteFileId};
use filestream_worker::{ByteStream, Worker, WorkerError, WorkerIdentity};

use crate::config::HttpWorkerConfig;
use crate::error::HttpBridgeError;

#[derive(Debug, Deserialize)]
struct MeResponse {
    name: String,
}

/// One authenticated session against the HTTP bridge.
///
/// Metadata and session lookups are bounded by the configured timeout. Byte
/// streams only bound the connection phase so long transfers are not cut
/// off mid-way.
pub struct HttpWorker {
    client: Client,
    config: HttpWorkerConfig,
    token: String,
}

impl HttpWorker {
    /// Create a worker authenticating with `token`, sharing `client`'s
    /// connection pool.
    pub fn new(client: Client, config: HttpWorkerConfig, token: impl Into<String>) -> Self {
        Self {
            client,
            config,
            token: token.into(),
        }
    }

    /// Build the URL `{base}/{segments...}` with each segment escaped.
    fn url(&self, segments: &[&str]) -> Result<Url, HttpBridgeError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| HttpBridgeError::InvalidUrl(format!("{}: {e}", self.config.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| HttpBridgeError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, HttpBridgeError> {
        let url = self.url(segments)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| HttpBridgeError::InvalidBody(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> HttpBridgeError {
        if e.is_timeout() {
            warn!("bridge request timed out");
            HttpBridgeError::Timeout(self.config.timeout)
        } else {
            HttpBridgeError::Http(e)
        }
    }

    /// Ask the bridge which account this session operates as.
    #[instrument(skip(self))]
    pub async fn whoami(&self) -> Result<WorkerIdentity, WorkerError> {
        let me: MeResponse = self.get_json(&["me"]).await?;
        Ok(WorkerIdentity::new(me.name))
    }
}

/// Turn non-success statuses into [`HttpBridgeError::UnexpectedStatus`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpBridgeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HttpBridgeError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

/// First and last byte of a `Content-Range: bytes start-end/size` value.
fn content_range_window(value: &str) -> Option<(u64, u64)> {
    let (unit, rest) = value.trim().split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (window, _size) = rest.split_once('/')?;
    let (start, end) = window.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

impl Worker for HttpWorker {
    #[instrument(skip_all, fields(message_id = %message_id))]
    async fn fetch_metadata(&self, message_id: MessageId) -> Result<FileMetadata, WorkerError> {
        let id = message_id.to_string();
        let metadata: FileMetadata = self.get_json(&["messages", &id]).await?;
        if metadata.message_id != message_id {
            return Err(WorkerError::InvalidResponse(format!(
                "asked for message {message_id}, bridge returned {}",
                metadata.message_id
            )));
        }
        debug!(file_size = metadata.file_size, "resolved metadata");
        Ok(metadata)
    }

    #[instrument(skip_all, fields(remote_file_id = %remote_file_id, start = range.start, end = range.end))]
    async fn fetch_bytes(
        &self,
        remote_file_id: &RemoteFileId,
        range: ByteRange,
    ) -> Result<ByteStream, WorkerError> {
        let url = self.url(&["files", remote_file_id.as_str()])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(header::RANGE, format!("bytes={}-{}", range.start, range.end))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = ensure_success(response).await?;

        // Whatever the status, the body must be exactly the requested bytes.
        if response.status() == StatusCode::PARTIAL_CONTENT {
            let window = response
                .headers()
                .get(header::CONTENT_RANGE)
                .and_then(|value| value.to_str().ok())
                .and_then(content_range_window);
            if window != Some((range.start, range.end)) {
                return Err(WorkerError::InvalidResponse(format!(
                    "bridge answered range {}-{} with {:?}",
                    range.start,
                    range.end,
                    response.headers().get(header::CONTENT_RANGE)
                )));
            }
        } else if range.start != 0 || response.content_length() != Some(range.len()) {
            return Err(WorkerError::InvalidResponse(format!(
                "bridge ignored range {}-{} (status {})",
                range.start,
                range.end,
                response.status()
            )));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| WorkerError::Connection(e.to_string())))
            .boxed())
    }
}
