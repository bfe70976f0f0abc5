use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::ScoredPosition,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub position: usize,
    pub results: Vec<ScoredPosition>,
}

/// Handler returning raw scored neighbours of a catalog position
///
/// The position is taken as a signed integer so that negative values are
/// reported as out of range rather than as an unparseable path.
pub async fn similar(
    State(state): State<Arc<AppState>>,
    Path(position): Path<i64>,
    Query(params): Query<SimilarQuery>,
) -> AppResult<Json<SimilarResponse>> {
    let len = state.recommender.catalog().len();
    let position =
        usize::try_from(position).map_err(|_| AppError::out_of_range(position, len))?;
    let k = params.k.unwrap_or(state.default_top_k);

    let results = state.recommender.similar_positions(position, k)?;

    Ok(Json(SimilarResponse { position, results }))
}
