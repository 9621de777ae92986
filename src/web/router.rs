//! Web application router and middleware setup.

use crate::metrics::MetricsRegistry;
use crate::web::config::WebConfig;
use crate::web::handlers;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the axum application serving `registry`.
pub fn create_app(config: &WebConfig, registry: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route(&config.metrics_path, get(handlers::metrics))
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::index))
        .with_state(registry)
        .layer(TraceLayer::new_for_http())
}
