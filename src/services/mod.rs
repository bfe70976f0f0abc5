pub mod artifact;
pub mod catalog;
pub mod enrichment;
pub mod providers;
pub mod ranker;
pub mod recommendations;

pub use catalog::{CatalogEntry, CatalogIndex};
pub use enrichment::PosterEnricher;
pub use ranker::{SimilarityMatrix, SimilarityRanker};
pub use recommendations::Recommender;
