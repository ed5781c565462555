//! Service descriptor

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use super::version::CURRENT_APP_VERSION;
use crate::AppState;

/// GET / - Name and endpoints of this service
async fn describe() -> Json<Value> {
    Json(json!({
        "message": "Skimpulse API Server",
        "endpoints": {
            "articles": "/api/skimfeed",
            "health": "/health",
            "version": "/api/version"
        },
        "version": CURRENT_APP_VERSION
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(describe))
}
