use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{EnrichedRecommendation, ScoredItem},
    services::providers::PosterProvider,
};

/// Image returned whenever a real poster cannot be obtained
pub const DEFAULT_PLACEHOLDER_URL: &str =
    "https://via.placeholder.com/500x750?text=Poster+Not+Available";

const POSTER_CACHE_TTL: u64 = 86400; // 1 day

/// Attaches poster URLs to ranked results
///
/// Every provider call is bounded by `timeout`. Cache reads have their own
/// short budget and count as misses when Redis is slow. Provider errors,
/// timeouts and missing posters all resolve to the placeholder, so enrichment
/// can never fail a recommendation.
#[derive(Clone)]
pub struct PosterEnricher {
    provider: Option<Arc<dyn PosterProvider>>,
    cache: Option<Cache>,
    timeout: Duration,
    placeholder_url: String,
}

impl PosterEnricher {
    pub fn new(
        provider: Arc<dyn PosterProvider>,
        timeout: Duration,
        placeholder_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider),
            cache: None,
            timeout,
            placeholder_url: placeholder_url.into(),
        }
    }

    /// An enricher with no provider; always yields the placeholder
    pub fn disabled(placeholder_url: impl Into<String>) -> Self {
        Self {
            provider: None,
            cache: None,
            timeout: Duration::ZERO,
            placeholder_url: placeholder_url.into(),
        }
    }

    /// Serves repeat lookups from Redis
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn placeholder_url(&self) -> &str {
        &self.placeholder_url
    }

    /// Poster URL for `external_id`, or the placeholder
    pub async fn display_image(&self, external_id: &str) -> String {
        let Some(provider) = &self.provider else {
            return self.placeholder_url.clone();
        };

        match self.lookup(provider.as_ref(), external_id).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                tracing::debug!(external_id = %external_id, "No poster available");
                self.placeholder_url.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, external_id = %external_id, "Poster lookup failed");
                self.placeholder_url.clone()
            }
        }
    }

    async fn lookup(
        &self,
        provider: &dyn PosterProvider,
        external_id: &str,
    ) -> AppResult<Option<String>> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::Poster(external_id.to_string()),
                POSTER_CACHE_TTL,
                self.fetch(provider, external_id)
            ),
            None => self.fetch(provider, external_id).await,
        }
    }

    /// Provider call bounded by `timeout`; the cache read has its own budget
    async fn fetch(
        &self,
        provider: &dyn PosterProvider,
        external_id: &str,
    ) -> AppResult<Option<String>> {
        timeout(self.timeout, provider.fetch_poster_url(external_id))
            .await
            .map_err(|_| {
                AppError::ExternalApi(format!(
                    "Poster lookup timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
    }

    /// Looks up every poster concurrently, keeping the ranking order
    pub async fn enrich(&self, recommendations: Vec<ScoredItem>) -> Vec<EnrichedRecommendation> {
        let mut poster_urls = vec![self.placeholder_url.clone(); recommendations.len()];

        if self.provider.is_some() {
            let mut lookups = JoinSet::new();
            for (index, recommendation) in recommendations.iter().enumerate() {
                let enricher = self.clone();
                let external_id = recommendation.item.external_id.clone();
                lookups.spawn(async move { (index, enricher.display_image(&external_id).await) });
            }

            while let Some(joined) = lookups.join_next().await {
                match joined {
                    Ok((index, url)) => poster_urls[index] = url,
                    Err(e) => tracing::error!(error = %e, "Poster lookup task failed"),
                }
            }
        }

        recommendations
            .into_iter()
            .zip(poster_urls)
            .map(|(recommendation, poster_url)| EnrichedRecommendation {
                recommendation,
                poster_url,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_redis_client;
    use crate::models::Item;
    use crate::services::providers::MockPosterProvider;

    const TIMEOUT: Duration = Duration::from_millis(200);

    /// Provider that never answers in time
    struct SlowProvider;

    #[async_trait::async_trait]
    impl PosterProvider for SlowProvider {
        async fn fetch_poster_url(&self, _external_id: &str) -> AppResult<Option<String>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Some("https://example.com/too-late.jpg".to_string()))
        }
    }

    fn scored(position: usize, external_id: &str) -> ScoredItem {
        ScoredItem {
            item: Item {
                position,
                title: format!("Movie {}", position),
                external_id: external_id.to_string(),
            },
            score: 1.0 / (position as f32 + 1.0),
        }
    }

    #[tokio::test]
    async fn test_found_poster_is_returned() {
        let mut provider = MockPosterProvider::new();
        provider
            .expect_fetch_poster_url()
            .times(1)
            .returning(|_| Ok(Some("https://image.tmdb.org/t/p/w500/a.jpg".to_string())));

        let enricher = PosterEnricher::new(Arc::new(provider), TIMEOUT, DEFAULT_PLACEHOLDER_URL);
        assert_eq!(
            enricher.display_image("19995").await,
            "https://image.tmdb.org/t/p/w500/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_missing_poster_falls_back() {
        let mut provider = MockPosterProvider::new();
        provider.expect_fetch_poster_url().returning(|_| Ok(None));

        let enricher = PosterEnricher::new(Arc::new(provider), TIMEOUT, DEFAULT_PLACEHOLDER_URL);
        assert_eq!(enricher.display_image("19995").await, DEFAULT_PLACEHOLDER_URL);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let mut provider = MockPosterProvider::new();
        provider
            .expect_fetch_poster_url()
            .returning(|_| Err(AppError::ExternalApi("TMDB API returned status 500".to_string())));

        let enricher = PosterEnricher::new(Arc::new(provider), TIMEOUT, DEFAULT_PLACEHOLDER_URL);
        assert_eq!(enricher.display_image("19995").await, DEFAULT_PLACEHOLDER_URL);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let enricher = PosterEnricher::new(
            Arc::new(SlowProvider),
            Duration::from_millis(20),
            DEFAULT_PLACEHOLDER_URL,
        );

        let started = std::time::Instant::now();
        assert_eq!(enricher.display_image("19995").await, DEFAULT_PLACEHOLDER_URL);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_cache_does_not_hide_posters() {
        let mut provider = MockPosterProvider::new();
        provider
            .expect_fetch_poster_url()
            .times(2)
            .returning(|_| Ok(Some("https://image.tmdb.org/t/p/w500/a.jpg".to_string())));

        let (cache, _handle) = Cache::new(create_redis_client("redis://127.0.0.1:1").unwrap());
        let enricher = PosterEnricher::new(
            Arc::new(provider),
            Duration::from_secs(2),
            DEFAULT_PLACEHOLDER_URL,
        )
        .with_cache(cache);

        let started = std::time::Instant::now();
        for _ in 0..2 {
            assert_eq!(
                enricher.display_image("19995").await,
                "https://image.tmdb.org/t/p/w500/a.jpg"
            );
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_disabled_enricher_uses_placeholder() {
        let enricher = PosterEnricher::disabled("https://example.com/none.png");
        let url = tokio_test::block_on(enricher.display_image("19995"));
        assert_eq!(url, "https://example.com/none.png");
        assert_eq!(enricher.placeholder_url(), "https://example.com/none.png");
    }

    #[tokio::test]
    async fn test_enrich_preserves_order_and_isolates_failures() {
        let mut provider = MockPosterProvider::new();
        provider
            .expect_fetch_poster_url()
            .times(3)
            .returning(|external_id| match external_id {
                "1" => Ok(Some("https://example.com/1.jpg".to_string())),
                "2" => Err(AppError::ExternalApi("boom".to_string())),
                _ => Ok(Some("https://example.com/3.jpg".to_string())),
            });

        let enricher = PosterEnricher::new(Arc::new(provider), TIMEOUT, DEFAULT_PLACEHOLDER_URL);
        let results = enricher
            .enrich(vec![scored(0, "1"), scored(1, "2"), scored(2, "3")])
            .await;

        let urls: Vec<&str> = results.iter().map(|r| r.poster_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/1.jpg",
                DEFAULT_PLACEHOLDER_URL,
                "https://example.com/3.jpg"
            ]
        );
        let positions: Vec<usize> = results.iter().map(|r| r.recommendation.item.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_enrich_with_slow_provider_still_returns_every_item() {
        let enricher = PosterEnricher::new(
            Arc::new(SlowProvider),
            Duration::from_millis(20),
            DEFAULT_PLACEHOLDER_URL,
        );

        let results = enricher.enrich(vec![scored(0, "1"), scored(1, "2")]).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.poster_url == DEFAULT_PLACEHOLDER_URL));
    }
}
