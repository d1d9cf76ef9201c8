// libs/exercise-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn exercise_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/progress", get(handlers::list_progress).post(handlers::record_progress))
        .route("/progress/stats", get(handlers::get_progress_stats))
        .route("/progress/streak", get(handlers::get_streak))
        .route("/progress/{progress_id}", get(handlers::get_progress))
        .route("/analytics/daily", get(handlers::get_daily_analytics))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
