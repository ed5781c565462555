//! Article feed endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use skimpulse_core::ArticleList;
use tracing::error;

use crate::AppState;

/// Successful feed response
#[derive(Debug, Serialize)]
struct ArticlesResponse {
    success: bool,
    articles: ArticleList,
    total: usize,
}

/// Create article routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/skimfeed", get(get_articles))
}

/// GET /api/skimfeed - Cached headline list, refreshed when stale
async fn get_articles(State(state): State<AppState>) -> Response {
    match state.article_cache.get_articles().await {
        Ok(articles) => (
            StatusCode::OK,
            Json(ArticlesResponse {
                success: true,
                total: articles.len(),
                articles,
            }),
        )
            .into_response(),
        Err(e) if e.is_not_found() => {
            error!("No articles to serve: {}", e);
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": e.to_string()
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to fetch articles: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to fetch skimfeed.com",
                    "details": e.to_string()
                })),
            )
                .into_response()
        }
    }
}
