//! HTTP handlers for the scrape endpoints.

use crate::metrics::MetricsRegistry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Current metrics in Prometheus text exposition format.
pub async fn metrics(State(registry): State<Arc<MetricsRegistry>>) -> Response {
    match registry.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Health check endpoint.
pub async fn health_check(State(registry): State<Arc<MetricsRegistry>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "yocto-exporter",
        "version": env!("CARGO_PKG_VERSION"),
        "sensor_read_passes": registry.passes(),
        "yapi_exceptions": registry.faults(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Landing page pointing at the metrics endpoint.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Yocto Exporter</title></head>
<body>
<h1>Yocto Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;
