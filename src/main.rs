use std::sync::Arc;
use std::time::Duration;

use cinesim_api::{
    config::Config,
    db::{create_redis_client, Cache},
    routes::{create_router, AppState},
    services::{artifact, providers::tmdb::TmdbProvider, PosterEnricher},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Catalog and matrix are loaded once and shared read-only from here on
    let recommender = artifact::load_artifact(&config.artifact_path)?;

    let mut enricher = match &config.tmdb_api_key {
        Some(api_key) => {
            let timeout = Duration::from_millis(config.enrichment_timeout_ms);
            let provider = TmdbProvider::new(
                api_key.clone(),
                config.tmdb_api_url.clone(),
                config.tmdb_image_base_url.clone(),
                timeout,
            )?;
            PosterEnricher::new(Arc::new(provider), timeout, config.poster_placeholder_url.clone())
        }
        None => {
            tracing::warn!("TMDB_API_KEY not set, posters will use the placeholder image");
            PosterEnricher::disabled(config.poster_placeholder_url.clone())
        }
    };

    let mut cache_writer = None;
    if let Some(redis_url) = &config.redis_url {
        let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
        enricher = enricher.with_cache(cache);
        cache_writer = Some(handle);
        tracing::info!("Poster caching enabled");
    }

    let state = AppState::new(recommender, enricher).with_default_top_k(config.default_top_k);
    let app = create_router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
