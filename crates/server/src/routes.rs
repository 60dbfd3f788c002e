use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Added last so it runs first and the trace span can see the id
        .layer(middleware::from_fn(request_id_middleware))
}

/// Routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", v1_routes())
}

/// Routes under /api/v1
fn v1_routes() -> Router<Arc<AppState>> {
    Router::new().route("/movies/recommend", get(handlers::get_recommendations))
}
