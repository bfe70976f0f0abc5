/// Poster metadata provider abstraction
///
/// Providers map a catalog item's external id to a display image. They sit
/// outside the ranking core: callers go through
/// [`PosterEnricher`](crate::services::enrichment::PosterEnricher), which
/// bounds each lookup and swallows failures.
use crate::error::AppResult;

pub mod tmdb;

/// Trait for poster metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Fetch the full poster URL for an item
    ///
    /// Returns `Ok(None)` when the provider knows the item but has no image
    /// for it. Transport and status failures are errors.
    async fn fetch_poster_url(&self, external_id: &str) -> AppResult<Option<String>>;
}
