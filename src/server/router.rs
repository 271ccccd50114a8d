use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{health, reply};
use crate::state::AppState;

/// Creates the application router.
///
/// Routes:
/// - `GET /` and `POST /`: the reply page and its form submission
/// - `POST /api/reply`: JSON drafting endpoint
/// - `GET /api/status` and `GET /health`
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(reply::index).post(reply::submit))
        .route("/api/reply", post(reply::api_reply))
        .route("/api/status", get(health::get_status))
        .route("/health", get(health::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
