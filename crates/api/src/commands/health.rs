//! Liveness and component health

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

/// Liveness probe kept compatible with the browser client.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Proxy server is running" }))
}

/// Component health including a live database probe.
///
/// Responds 503 when the service is below the health threshold.
pub async fn detailed_health(
    State(ctx): State<Arc<AppContext>>,
) -> (StatusCode, Json<HealthStatus>) {
    let status = ctx.health_check().await;
    let code = if status.is_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(status))
}
