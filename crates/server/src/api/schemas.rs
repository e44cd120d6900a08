use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON error body returned by failing endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error description.
    #[schema(example = "invalid link hash")]
    pub error: String,
}

/// Liveness response for `GET /`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    #[schema(example = "Server is running.")]
    pub message: String,
    #[schema(example = true)]
    pub ok: bool,
    /// Time since startup, e.g. `1h 2m 3s`.
    #[schema(example = "1h 2m 3s")]
    pub uptime: String,
    /// Server version.
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Number of worker sessions in the pool.
    #[schema(example = 3)]
    pub workers: usize,
    /// Whether the pool accepts traffic.
    pub ready: bool,
}

/// Gateway counters plus per-worker load.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Links minted by `/generate`.
    #[schema(example = 42)]
    pub links_generated: u64,
    /// Streams whose first byte request succeeded.
    #[schema(example = 40)]
    pub streams_opened: u64,
    /// Stream requests rejected for a wrong hash.
    #[schema(example = 1)]
    pub hash_mismatches: u64,
    /// Metadata lookups that failed.
    #[schema(example = 0)]
    pub resolution_failures: u64,
    /// Byte requests that failed, before or during transfer.
    #[schema(example = 0)]
    pub stream_failures: u64,
    /// Metadata served from the cache.
    #[schema(example = 80)]
    pub cache_hits: u64,
    /// Metadata fetched from the backing store.
    #[schema(example = 2)]
    pub cache_misses: u64,
    /// Approximate number of cached metadata entries.
    #[schema(example = 2)]
    pub cache_entries: u64,
    /// Per-worker selection counts, in pool order.
    pub workers: Vec<WorkerLoad>,
}

/// How often one pool member was selected.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkerLoad {
    /// Position in the pool.
    pub index: usize,
    /// Session name reported by the backing store.
    #[schema(example = "worker-1")]
    pub name: String,
    /// Times the round-robin cursor landed on this worker.
    pub selected: u64,
}
