//! API route definitions

mod articles;
mod health;
mod rate_limit;
mod root;
mod version;

use axum::{
    http::{header, Method},
    middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the rate-limited `/api` routes
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(articles::routes())
        .merge(version::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    // Configure CORS for the mobile and web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api_routes(&state))
        .merge(health::routes())
        .merge(root::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
