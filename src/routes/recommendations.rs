use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{EnrichedRecommendation, Item},
    routes::AppState,
};

/// Largest `k` accepted for enriched recommendations
pub const MAX_RECOMMENDATIONS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: Item,
    pub recommendations: Vec<EnrichedRecommendation>,
    pub elapsed_ms: u64,
}

/// Handler for recommendations endpoint
///
/// Ranking errors are returned as-is. Poster failures never are: each one
/// degrades to the placeholder image.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let start = Instant::now();
    let k = params.k.unwrap_or(state.default_top_k);

    if k > MAX_RECOMMENDATIONS {
        return Err(AppError::InvalidInput(format!(
            "k must be at most {}",
            MAX_RECOMMENDATIONS
        )));
    }

    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        k = k,
        "Processing recommendation request"
    );

    let query = state.recommender.lookup(&params.title)?.clone();
    let ranked = state.recommender.recommend_position(query.position, k)?;
    let recommendations = state.enricher.enrich(ranked).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        request_id = %request_id,
        results = recommendations.len(),
        elapsed_ms = elapsed_ms,
        "Recommendations ready"
    );

    Ok(Json(RecommendationResponse {
        query,
        recommendations,
        elapsed_ms,
    }))
}
