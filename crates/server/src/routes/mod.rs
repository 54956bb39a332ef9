//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health         - Health check
//! GET  /               - App entry: greet installed shops, else start install
//! GET  /auth           - Redirect to the shop's OAuth authorization page
//! GET  /auth/callback  - Handle the OAuth callback, store the session
//! GET  /appinstalled   - Installation confirmation
//! POST /quiz-results   - Sync a quiz submission into a customer metafield
//! ```

pub mod install;
pub mod quiz;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // App installation
        .route("/", get(install::entry))
        .route("/auth", get(install::begin))
        .route("/auth/callback", get(install::callback))
        .route("/appinstalled", get(install::installed))
        // Quiz results
        .route("/quiz-results", post(quiz::submit))
}

/// Assemble the full application router with middleware and state.
///
/// Error-tracking layers are added by the binary on top of this.
pub fn router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
