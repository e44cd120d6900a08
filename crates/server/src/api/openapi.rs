#![allow(clippy::needless_for_each)]

use super::schemas::{ErrorResponse, HealthResponse, MetricsResponse, RootResponse, WorkerLoad};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Filestream API",
        version = "0.1.0",
        description = "Shareable, hash-protected stream links for files stored in a chat-based backing store.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service liveness, health and metrics"),
        (name = "Links", description = "Link generation and streaming")
    ),
    paths(
        super::root::root,
        super::health::health,
        super::health::metrics,
        super::generate::generate,
        super::stream::stream,
    ),
    components(schemas(
        ErrorResponse,
        RootResponse,
        HealthResponse,
        MetricsResponse,
        WorkerLoad,
    ))
)]
pub struct ApiDoc;
