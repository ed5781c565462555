//! Shared fixtures for route tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use skimpulse_core::{Article, ArticleList};
use skimpulse_feed::{ArticleSource, FeedError};
use skimpulse_services::{ArticleCache, RateLimiter, DEFAULT_CACHE_TTL};

use crate::config::AppConfig;
use crate::AppState;

/// Source that always returns the same outcome and counts calls
pub struct StaticSource {
    result: Result<ArticleList, FeedError>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn ok(articles: ArticleList) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(articles),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn err(error: FeedError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleSource for StaticSource {
    async fn fetch_articles(&self) -> Result<ArticleList, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub fn sample_articles(count: usize, ranked: bool) -> ArticleList {
    (1..=count)
        .map(|i| {
            let title = format!("Sample headline number {}", i);
            let url = format!("https://skimfeed.com/r.php?id={}", i);
            if ranked {
                Article::ranked(title, url, i)
            } else {
                Article::new(title, url)
            }
        })
        .collect()
}

pub fn test_state(source: Arc<StaticSource>, rate_limiter: Option<Arc<RateLimiter>>) -> AppState {
    AppState {
        article_cache: ArticleCache::new(source, DEFAULT_CACHE_TTL),
        rate_limiter,
        config: Arc::new(AppConfig::default()),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
