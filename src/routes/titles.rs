use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{error::AppResult, models::Item, routes::AppState};

const DEFAULT_SEARCH_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

/// Handler listing every catalog title in position order
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<Item>> {
    Json(state.recommender.catalog().items().to_vec())
}

/// Handler for title search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let titles = state
        .recommender
        .catalog()
        .search(&params.q, limit)?
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(titles))
}
