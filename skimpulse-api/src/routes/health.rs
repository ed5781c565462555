//! Health check endpoint

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use skimpulse_services::CacheStatus;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    environment: String,
    cache: CacheHealth,
}

/// Cache section of the health report; details only once something is cached
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct CacheHealth {
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_age_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl_seconds: Option<u64>,
}

impl From<CacheStatus> for CacheHealth {
    fn from(status: CacheStatus) -> Self {
        if !status.cached {
            return Self {
                cached: false,
                cache_age_seconds: None,
                is_valid: None,
                ttl_seconds: None,
            };
        }

        Self {
            cached: true,
            cache_age_seconds: status.age.map(|age| age.as_secs()),
            is_valid: Some(status.is_valid),
            ttl_seconds: Some(status.ttl.as_secs()),
        }
    }
}

/// Health check handler; reads cache state without fetching
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: state.config.environment.clone(),
        cache: state.article_cache.status().into(),
    })
}

/// Create health route
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
