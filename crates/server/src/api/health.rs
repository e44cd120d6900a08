use axum::Json;
use axum::extract::State;

use super::AppState;
use super::schemas::{HealthResponse, MetricsResponse, WorkerLoad};

/// `GET /health` -- pool size and readiness.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    description = "Returns service status, the number of worker sessions and whether traffic is accepted.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool = state.gateway.pool();
    Json(HealthResponse {
        status: "ok".into(),
        workers: pool.len(),
        ready: pool.is_ready(),
    })
}

/// `GET /metrics` -- gateway counters and per-worker load as JSON.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    summary = "Gateway metrics",
    description = "Returns link, stream and cache counters together with how often each worker was selected.",
    responses(
        (status = 200, description = "Current metric counters", body = MetricsResponse)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let gateway = &state.gateway;
    let snap = gateway.metrics().snapshot();
    let workers = gateway
        .pool()
        .snapshot()
        .workers
        .into_iter()
        .map(|slot| WorkerLoad {
            index: slot.index,
            name: slot.identity.to_string(),
            selected: slot.selected,
        })
        .collect();

    Json(MetricsResponse {
        links_generated: snap.links_generated,
        streams_opened: snap.streams_opened,
        hash_mismatches: snap.hash_mismatches,
        resolution_failures: snap.resolution_failures,
        stream_failures: snap.stream_failures,
        cache_hits: snap.cache_hits,
        cache_misses: snap.cache_misses,
        cache_entries: gateway.cache().entry_count(),
        workers,
    })
}
