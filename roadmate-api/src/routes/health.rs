/// Liveness and health endpoints
///
/// # Endpoints
///
/// - `GET /` - constant `{"ok": true}`
/// - `GET /health` - database connectivity and pool usage
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 2, "total_connections": 3 }
/// }
/// ```

use axum::{extract::State, Json};
use roadmate_shared::db::pool::{self, PoolStats};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{app::AppState, error::ApiResult};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: &'static str,

    pub version: &'static str,

    /// `connected` or `disconnected`
    pub database: &'static str,

    pub pool: PoolStats,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Reports whether the database answers within the request deadline
///
/// Never fails: an unreachable database is reported as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = state
        .bounded(async { Ok(pool::health_check(&state.db).await.is_ok()) })
        .await
        .unwrap_or(false);

    if !connected {
        tracing::warn!("Health check could not reach the database");
    }

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        version: roadmate_shared::VERSION,
        database: if connected { "connected" } else { "disconnected" },
        pool: pool::pool_stats(&state.db),
    }))
}
