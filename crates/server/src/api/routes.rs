use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::cache::response_cache_middleware;
use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, samples, search, tutorials};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Live lookups, served through the response cache
    let cached_routes = Router::new()
        .route("/api/search", get(search::search_tutorials))
        .route("/api/tutorials/{id}", get(tutorials::get_tutorial))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            response_cache_middleware,
        ));

    // Generation requires an authenticated caller
    let protected_routes = Router::new()
        .route("/api/tutorials/generate", post(tutorials::generate_tutorial))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        // Health, config and metrics
        .route("/api/health", get(handlers::health))
        .route("/api/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Static samples
        .route("/api/sample/tutorials", get(samples::list_samples))
        .route("/api/sample/tutorials/{id}", get(samples::get_sample))
        .merge(cached_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
