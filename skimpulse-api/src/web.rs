//! Static hosting for the built web client

use std::path::Path;

use axum::Router;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Serve files from `dir`, falling back to `index.html` for client-side routes
pub fn router(dir: &Path) -> Router {
    let index = ServeFile::new(dir.join("index.html"));

    Router::new()
        .fallback_service(ServeDir::new(dir).fallback(index))
        .layer(TraceLayer::new_for_http())
}
