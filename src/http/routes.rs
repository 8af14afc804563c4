use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session state
        .route("/session", get(handlers::get_session))
        // Capture control
        .route("/session/start", post(handlers::start))
        .route("/session/pause", post(handlers::pause))
        .route("/session/resume", post(handlers::resume))
        .route("/session/stop", post(handlers::stop))
        // Commit or drop the stopped recording
        .route("/session/upload", post(handlers::upload))
        .route("/session/discard", post(handlers::discard))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
