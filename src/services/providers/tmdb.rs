/// TMDB (The Movie Database) poster provider
///
/// API Flow:
/// 1. Details: /movie/{id}?api_key=... → returns `poster_path` (may be null)
/// 2. Image URL: {image_base_url}{poster_path}
use crate::{
    error::{AppError, AppResult},
    services::providers::PosterProvider,
};
use reqwest::{Client as HttpClient, Url};
use serde::Deserialize;
use std::time::Duration;

/// Subset of the TMDB movie details response we read
#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: Url,
    image_base_url: String,
}

impl TmdbProvider {
    /// Creates a provider whose HTTP requests give up after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        image_base_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| AppError::Internal(format!("Invalid TMDB API URL {}: {}", api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "TMDB API URL {} cannot take a path",
                api_url
            )));
        }

        Ok(Self {
            http_client,
            api_key,
            api_url,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Details endpoint for one movie; the id is a single escaped path segment
    fn details_url(&self, external_id: &str) -> AppResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(format!("TMDB API URL {} cannot take a path", self.api_url)))?
            .pop_if_empty()
            .extend(["movie", external_id]);
        Ok(url)
    }

    /// Joins a `poster_path` onto the image base URL; empty paths count as missing
    fn poster_url(&self, poster_path: Option<String>) -> Option<String> {
        poster_path
            .filter(|path| !path.trim().is_empty())
            .map(|path| {
                if path.starts_with('/') {
                    format!("{}{}", self.image_base_url, path)
                } else {
                    format!("{}/{}", self.image_base_url, path)
                }
            })
    }
}

#[async_trait::async_trait]
impl PosterProvider for TmdbProvider {
    async fn fetch_poster_url(&self, external_id: &str) -> AppResult<Option<String>> {
        let url = self.details_url(external_id)?;

        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let details: TmdbMovieDetails = response.json().await?;
        let poster_url = self.poster_url(details.poster_path);

        tracing::debug!(
            external_id = %external_id,
            found = poster_url.is_some(),
            provider = "tmdb",
            "Poster lookup completed"
        );

        Ok(poster_url)
    }
}
