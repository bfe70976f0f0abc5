//! Loading of the precomputed catalog + similarity bundle
//!
//! The bundle is a JSON document produced by the offline pipeline:
//!
//! ```json
//! {
//!   "items": [{ "title": "Avatar", "external_id": 19995 }, ...],
//!   "similarity": [[1.0, 0.12, ...], ...]
//! }
//! ```
//!
//! Item positions are their index in `items`. `external_id` may be a string
//! or an integer. A `null` similarity entry stands for NaN, which JSON cannot
//! express directly.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    services::{
        catalog::{CatalogEntry, CatalogIndex},
        ranker::SimilarityMatrix,
        recommendations::Recommender,
    },
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExternalId {
    Text(String),
    Number(i64),
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        match id {
            ExternalId::Text(text) => text,
            ExternalId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactItem {
    title: String,
    external_id: ExternalId,
}

/// Raw bundle as read from disk, before validation
#[derive(Debug, Deserialize)]
pub struct SimilarityArtifact {
    items: Vec<ArtifactItem>,
    similarity: Vec<Vec<Option<f32>>>,
}

impl SimilarityArtifact {
    /// Parses a bundle from any JSON source
    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        serde_json::from_reader(reader)
            .map_err(|e| AppError::MalformedData(format!("Invalid similarity artifact: {}", e)))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Validates the bundle and builds the shared recommender
    pub fn into_recommender(self) -> AppResult<Recommender> {
        let catalog = CatalogIndex::new(
            self.items
                .into_iter()
                .map(|item| CatalogEntry::new(item.title, item.external_id)),
        );

        let rows = self
            .similarity
            .into_iter()
            .map(|row| row.into_iter().map(|s| s.unwrap_or(f32::NAN)).collect())
            .collect();

        Recommender::new(catalog, SimilarityMatrix::new(rows)?)
    }
}

/// Reads the bundle at `path` and builds the recommender
pub fn load_artifact(path: &Path) -> AppResult<Recommender> {
    let start = Instant::now();

    let file = File::open(path).map_err(|e| {
        AppError::MalformedData(format!(
            "Cannot open similarity artifact {}: {}",
            path.display(),
            e
        ))
    })?;

    let recommender = SimilarityArtifact::from_reader(BufReader::new(file))?.into_recommender()?;

    tracing::info!(
        path = %path.display(),
        items = recommender.catalog().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Similarity artifact loaded"
    );

    Ok(recommender)
}
