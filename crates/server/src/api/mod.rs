pub mod generate;
pub mod health;
pub mod openapi;
pub mod root;
pub mod schemas;
pub mod stream;
pub mod trace_context;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use filestream_gateway::Gateway;

use crate::error::ServerError;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The gateway instance.
    pub gateway: Arc<Gateway>,
    /// When the server started, for the uptime report.
    pub started_at: Instant,
}

impl AppState {
    /// State for a server starting now.
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            started_at: Instant::now(),
        }
    }
}

/// Build the Axum router with all routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics));

    // Link and stream endpoints need a started worker pool.
    let gated = Router::new()
        .route("/generate/{message_id}", get(generate::generate))
        .route("/stream/{file}", get(stream::stream))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_ready));

    Router::new()
        .merge(public)
        .merge(gated)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(middleware::from_fn(trace_context::propagate_trace_context))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn require_ready(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.gateway.pool().is_ready() {
        return ServerError::NotReady.into_response();
    }
    next.run(request).await
}
