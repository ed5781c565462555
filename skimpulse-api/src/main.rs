//! Skimpulse API Server
//!
//! HTTP API server that scrapes skimfeed.com headlines and serves them from
//! an in-memory TTL cache.

mod config;
mod routes;
mod web;

#[cfg(test)]
mod test_support;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use skimpulse_feed::SkimfeedSource;
use skimpulse_services::{ArticleCache, RateLimiter};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub article_cache: ArticleCache,
    /// Per-IP admission control for `/api` (None when disabled)
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub config: Arc<AppConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,skimpulse_api=debug")),
        )
        .init();

    info!("Starting Skimpulse API");

    let config = Arc::new(AppConfig::from_env());

    let source = SkimfeedSource::from_config(config.fetcher_config(), config.extractor_config())?;
    let article_cache = ArticleCache::new(Arc::new(source), config.cache_ttl);

    let rate_limiter = if config.rate_limit_per_minute > 0 {
        let limiter = Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute, "api"));

        // Forget clients whose window has lapsed
        let limiter_for_prune = Arc::clone(&limiter);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter_for_prune.window());
            loop {
                ticker.tick().await;
                let pruned = limiter_for_prune.prune_expired();
                if pruned > 0 {
                    let stats = limiter_for_prune.stats();
                    debug!(
                        "Pruned {} expired rate limit windows ({} clients tracked, {}/{} requests rejected)",
                        pruned, stats.tracked_clients, stats.rejected_requests, stats.total_requests
                    );
                }
            }
        });

        Some(limiter)
    } else {
        info!("Rate limiting disabled");
        None
    };

    let state = AppState {
        article_cache,
        rate_limiter,
        config: Arc::clone(&config),
    };

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("API endpoint: http://{}/api/skimfeed", addr);
    info!("Environment: {}", config.environment);
    info!("Caching enabled: {} seconds TTL", config.cache_ttl.as_secs());
    if config.rate_limit_per_minute > 0 {
        info!(
            "Rate limiting: {} requests per minute per IP",
            config.rate_limit_per_minute
        );
    }

    let api_server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .into_future();

    match &config.web {
        Some(web_config) => {
            let web_addr = SocketAddr::from(([0, 0, 0, 0], web_config.port));
            let web_listener = tokio::net::TcpListener::bind(web_addr).await?;
            info!(
                "Web app from {} on http://{}",
                web_config.dir.display(),
                web_addr
            );

            let web_server = axum::serve(web_listener, web::router(&web_config.dir))
                .with_graceful_shutdown(shutdown_signal())
                .into_future();

            tokio::try_join!(api_server, web_server)?;
        }
        None => api_server.await?,
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
