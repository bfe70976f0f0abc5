use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{Item, ScoredItem, ScoredPosition},
    services::{
        catalog::CatalogIndex,
        ranker::{SimilarityMatrix, SimilarityRanker},
    },
};

/// Number of recommendations returned by [`Recommender::recommend`]
pub const DEFAULT_TOP_K: usize = 10;

/// Loaded catalog and similarity matrix, shared read-only by every request
///
/// Built once at startup. Nothing mutates it afterwards, so it can sit behind
/// an `Arc` and be queried from any number of tasks without locking.
#[derive(Debug)]
pub struct Recommender {
    catalog: CatalogIndex,
    ranker: SimilarityRanker,
    loaded_at: DateTime<Utc>,
}

impl Recommender {
    /// Pairs a catalog with its matrix, checking that their sizes agree
    pub fn new(catalog: CatalogIndex, matrix: SimilarityMatrix) -> AppResult<Self> {
        if matrix.dimension() != catalog.len() {
            return Err(AppError::MalformedData(format!(
                "similarity matrix is {0}x{0} but the catalog has {1} items",
                matrix.dimension(),
                catalog.len()
            )));
        }

        Ok(Self {
            catalog,
            ranker: SimilarityRanker::new(matrix),
            loaded_at: Utc::now(),
        })
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// The ten items most similar to `title`
    pub fn recommend(&self, title: &str) -> AppResult<Vec<ScoredItem>> {
        self.recommend_k(title, DEFAULT_TOP_K)
    }

    /// The `k` items most similar to `title`
    pub fn recommend_k(&self, title: &str, k: usize) -> AppResult<Vec<ScoredItem>> {
        let position = self.catalog.resolve(title)?;
        self.recommend_position(position, k)
    }

    /// The `k` items most similar to the item at `position`, with attributes
    pub fn recommend_position(&self, position: usize, k: usize) -> AppResult<Vec<ScoredItem>> {
        self.ranker
            .top_k(position, k)?
            .into_iter()
            .map(|scored| {
                Ok(ScoredItem {
                    item: self.catalog.attributes(scored.position)?.clone(),
                    score: scored.score,
                })
            })
            .collect()
    }

    /// Raw ranking without attribute lookup
    pub fn similar_positions(&self, position: usize, k: usize) -> AppResult<Vec<ScoredPosition>> {
        self.ranker.top_k(position, k)
    }

    /// Resolves a title straight to its catalog entry
    pub fn lookup(&self, title: &str) -> AppResult<&Item> {
        let position = self.catalog.resolve(title)?;
        self.catalog.attributes(position)
    }
}
