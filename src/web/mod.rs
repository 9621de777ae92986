//! Scrape server exposing the metrics registry over HTTP.
//!
//! The server only reads the registry; it runs on its own task and never
//! waits on the collection loop.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{ExporterError, Result};
use crate::metrics::MetricsRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Bind and serve `registry` until the server fails.
pub async fn start_web_server(config: WebConfig, registry: Arc<MetricsRegistry>) -> Result<()> {
    let app = create_app(&config, registry);

    // Parse the bind address
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| ExporterError::config_error(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!("Serving metrics on http://{}{}", addr, config.metrics_path);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
