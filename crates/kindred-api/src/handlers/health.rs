//! Health check handler.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::warn;

use kindred_database::DatabasePool;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let gateway = &state.realtime.gateway;
    let database = database_status(state.db.as_ref()).await;
    let status = if database == "unavailable" {
        "degraded"
    } else {
        "ok"
    };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        database: database.to_string(),
        ws_connections: gateway.connection_count(),
        connected_users: gateway.connected_user_count(),
        online_users: gateway.online_count(),
        metrics: gateway.metrics(),
    }))
}

/// `disabled` without a pool, otherwise the outcome of a `SELECT 1`.
async fn database_status(db: Option<&DatabasePool>) -> &'static str {
    let Some(db) = db else {
        return "disabled";
    };
    match db.health_check().await {
        Ok(true) => "connected",
        Ok(false) => "unavailable",
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            "unavailable"
        }
    }
}
