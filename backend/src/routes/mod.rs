//! Route definitions for the orchard

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Orchard page and action routes
pub fn orchard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_apples))
        .route("/stats", get(handlers::get_stats))
        .route("/generate-apples", post(handlers::generate_apples))
        .route("/fall-apple", post(handlers::fall_apple))
        .route("/eat-apple", post(handlers::eat_apple))
        .route("/delete-apple", post(handlers::delete_apple))
        .route("/delete-rotten-apples", post(handlers::delete_rotten_apples))
}
