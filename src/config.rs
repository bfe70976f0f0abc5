use serde::Deserialize;
use std::path::PathBuf;

use crate::services::{enrichment::DEFAULT_PLACEHOLDER_URL, recommendations::DEFAULT_TOP_K};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the precomputed catalog + similarity matrix bundle
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// TMDB API key. Without it every poster falls back to the placeholder.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix joined with a movie's `poster_path`
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Image shown when no poster can be fetched
    #[serde(default = "default_poster_placeholder_url")]
    pub poster_placeholder_url: String,

    /// Upper bound on a single poster lookup, in milliseconds
    #[serde(default = "default_enrichment_timeout_ms")]
    pub enrichment_timeout_ms: u64,

    /// Number of recommendations returned when the caller does not ask for `k`
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Redis connection URL, enables poster caching when set
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("data/similarity.json")
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_poster_placeholder_url() -> String {
    DEFAULT_PLACEHOLDER_URL.to_string()
}

fn default_enrichment_timeout_ms() -> u64 {
    5000
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
