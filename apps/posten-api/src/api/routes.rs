use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{delivery, meta};
use super::state::AppState;

/// Builds the full application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(meta::index))
        .route("/favicon.ico", get(meta::favicon))
        .route("/healthz", get(meta::healthz))
        // `:code` also matches the `.json` suffixed form
        .route("/raw/:code", get(delivery::delivery_raw))
        .route("/text/:code", get(delivery::delivery_text))
        .route("/next/:code", get(delivery::delivery_next))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
