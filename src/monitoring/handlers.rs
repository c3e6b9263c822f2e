//! HTTP handlers for monitoring endpoints
//!
//! Endpoints:
//! - GET /monitoring/health - Health status (JSON)
//! - GET /monitoring/metrics - Prometheus format metrics

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::MonitoringContext;
use crate::api::AppState;

/// Health check endpoint
///
/// Response:
/// ```json
/// {
///   "status": "healthy",
///   "timestamp": "2026-10-19T12:30:45Z",
///   "uptime_seconds": 123.45,
///   "model": "cohere-default",
///   "reference_documents": 2,
///   "snippets": 14,
///   "api_key_configured": true
/// }
/// ```
pub async fn health_handler(
    ctx: web::Data<MonitoringContext>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let grader = &state.grader;
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": ctx.uptime_seconds(),
        "model": grader.model_name(),
        "reference_documents": grader.library().documents.len(),
        "snippets": grader.snippets().len(),
        "api_key_configured": grader.has_default_key(),
    })))
}

/// Prometheus metrics endpoint
pub async fn metrics_handler() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(super::export_prometheus()))
}
