use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{recommendations::DEFAULT_TOP_K, PosterEnricher, Recommender},
};

pub mod recommendations;
pub mod similar;
pub mod titles;

/// Shared application state
///
/// Everything here is read-only after startup, so handlers share it through
/// an `Arc` without locking.
pub struct AppState {
    pub recommender: Recommender,
    pub enricher: PosterEnricher,
    pub default_top_k: usize,
}

impl AppState {
    pub fn new(recommender: Recommender, enricher: PosterEnricher) -> Self {
        Self {
            recommender,
            enricher,
            default_top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_default_top_k(mut self, default_top_k: usize) -> Self {
        self.default_top_k = default_top_k;
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titles", get(titles::list))
        .route("/titles/search", get(titles::search))
        .route("/recommendations", get(recommendations::recommend))
        .route("/items/:position/similar", get(similar::similar))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "items": state.recommender.catalog().len(),
            "loaded_at": state.recommender.loaded_at(),
        })),
    )
}
