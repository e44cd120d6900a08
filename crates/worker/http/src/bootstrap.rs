use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::info;

use filestream_worker::{SessionBootstrap, StartedWorker, WorkerError};

use crate::config::HttpWorkerConfig;
use crate::error::HttpBridgeError;
use crate::worker::HttpWorker;

/// Starts one [`HttpWorker`] per token against a single bridge.
///
/// Every session is checked with `GET /me` before it is handed to the pool,
/// so a bad token fails at startup instead of on the first request.
pub struct HttpBootstrap {
    client: Client,
    config: HttpWorkerConfig,
    primary_token: String,
    additional_tokens: Vec<String>,
}

impl HttpBootstrap {
    /// Create a bootstrap sharing one connection pool across all sessions.
    pub fn new(
        config: HttpWorkerConfig,
        primary_token: impl Into<String>,
        additional_tokens: Vec<String>,
    ) -> Result<Self, WorkerError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(HttpBridgeError::Http)?;
        Ok(Self {
            client,
            config,
            primary_token: primary_token.into(),
            additional_tokens,
        })
    }

    async fn start(&self, token: &str) -> Result<StartedWorker, WorkerError> {
        let worker = HttpWorker::new(self.client.clone(), self.config.clone(), token);
        let identity = worker.whoami().await?;
        info!(identity = %identity, base_url = %self.config.base_url, "bridge session authenticated");
        Ok(StartedWorker {
            worker: Arc::new(worker),
            identity,
        })
    }
}

#[async_trait]
impl SessionBootstrap for HttpBootstrap {
    async fn start_primary(&self) -> Result<StartedWorker, WorkerError> {
        self.start(&self.primary_token).await
    }

    async fn start_additional(&self) -> Vec<Result<StartedWorker, WorkerError>> {
        join_all(self.additional_tokens.iter().map(|token| self.start(token))).await
    }
}
