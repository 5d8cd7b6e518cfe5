use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{ask, health, ingest};
use crate::state::AppState;

/// Builds the application router: health probe, the ask pipeline, and
/// section ingestion, behind CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/ask", post(ask::ask))
        .route("/api/ingest", post(ingest::ingest))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}
