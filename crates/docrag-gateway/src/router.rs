use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{build_index_handler, health_handler, process_query_handler};
use super::server::AppState;

/// Routes for the gateway. Request bodies above `max_body_size` are refused with 413.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    let api = Router::new()
        .route("/build_index", post(build_index_handler))
        .route("/process_query", post(process_query_handler))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
