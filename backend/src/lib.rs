//! Orchard server
//!
//! A small web application tracking apples through their lifecycle: they grow
//! on the tree, fall, and are then eaten or left to rot.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::Clock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::Config;

use repository::AppleRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn AppleRepository>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(routes::orchard_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
