//! Scavenger — HTTP adapter.
//!
//! Exposes the hunt catalog, the submission pipeline and the clue dispatcher
//! as a JSON API, and owns configuration and logging bootstrap.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

/// Builds the full application router.
pub fn app(state: state::AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the presentation app's origin.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/hunts", routes::hunts::router())
        .nest("/api/v1/progress", routes::progress::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
