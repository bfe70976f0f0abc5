use serde::{Deserialize, Serialize};

/// One catalog entry, addressed by its row/column in the similarity matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// 0-based position, stable for the lifetime of the loaded catalog
    pub position: usize,
    /// Human-facing lookup key. Not guaranteed unique.
    pub title: String,
    /// Provider key handed to poster enrichment (TMDB movie id)
    pub external_id: String,
}

/// A candidate position and its similarity to the query
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScoredPosition {
    pub position: usize,
    /// `null` in JSON when the matrix held NaN for this pair
    pub score: f32,
}

/// A ranked item with its display attributes
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: Item,
    pub score: f32,
}

/// A ranked item after poster enrichment
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedRecommendation {
    #[serde(flatten)]
    pub recommendation: ScoredItem,
    pub poster_url: String,
}
