use std::path::Path;
use std::sync::Arc;

use filestream_core::MessageId;
use filestream_worker::SessionBootstrap;
use filestream_worker_http::{HttpBootstrap, HttpWorkerConfig};
use filestream_worker_memory::{MemoryBootstrap, MemoryContentStore};
use tracing::info;

use crate::config::{HttpWorkersConfig, MemoryWorkersConfig, WorkersConfig};
use crate::error::ServerError;

/// Construct the session bootstrap for the configured worker backend.
pub async fn create_bootstrap(
    config: &WorkersConfig,
) -> Result<Box<dyn SessionBootstrap>, ServerError> {
    match config.backend.as_str() {
        "memory" => create_memory(&config.memory).await,
        "http" => create_http(&config.http),
        other => Err(ServerError::Config(format!(
            "unsupported worker backend: {other}"
        ))),
    }
}

async fn create_memory(
    config: &MemoryWorkersConfig,
) -> Result<Box<dyn SessionBootstrap>, ServerError> {
    let store = Arc::new(MemoryContentStore::new());
    for file in &config.files {
        let data = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ServerError::Config(format!("failed to read {}: {e}", file.path)))?;
        let file_name = file.file_name.clone().unwrap_or_else(|| {
            Path::new(&file.path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let metadata = store.put_file(
            MessageId::new(file.message_id),
            file_name,
            file.mime_type.clone(),
            format!("local-{}", file.message_id),
            data,
        );
        info!(
            message_id = %metadata.message_id,
            file_name = %metadata.file_name,
            size = metadata.file_size,
            "loaded file into memory store"
        );
    }
    Ok(Box::new(MemoryBootstrap::new(store, config.additional)))
}

fn create_http(config: &HttpWorkersConfig) -> Result<Box<dyn SessionBootstrap>, ServerError> {
    let primary_token = config.primary_token.as_deref().ok_or_else(|| {
        ServerError::Config("workers.http.primary_token is required for the http backend".into())
    })?;
    let worker_config = HttpWorkerConfig::new(config.base_url.clone())
        .with_timeout(std::time::Duration::from_secs(config.timeout_seconds));
    let bootstrap = HttpBootstrap::new(
        worker_config,
        primary_token,
        config.additional_tokens.clone(),
    )?;
    Ok(Box::new(bootstrap))
}
