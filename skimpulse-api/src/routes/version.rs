//! App version check endpoint for forced updates

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::AppState;

/// Latest app version this server knows about
pub const CURRENT_APP_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionResponse {
    current_version: &'static str,
    minimum_version: String,
    latest_version: String,
    force_update: bool,
    update_url: Option<String>,
    update_message: String,
    timestamp: String,
}

/// Create version routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/version", get(get_version))
}

/// GET /api/version - Update policy for the mobile client
async fn get_version(State(state): State<AppState>) -> Json<VersionResponse> {
    let version = &state.config.version;

    Json(VersionResponse {
        current_version: CURRENT_APP_VERSION,
        minimum_version: version.minimum_version.clone(),
        latest_version: version.latest_version.clone(),
        force_update: version.force_update,
        update_url: version.update_url.clone(),
        update_message: version.update_message.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
