use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

use crate::api::middleware::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: String,
    pub version: String,
    pub database: DatabaseHealth,
}

/// Reachability of Postgres plus a snapshot of the connection pool
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub response_time_ms: u128,
    pub pool_size: u32,
    pub idle_connections: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health`: 200 when the database answers, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = check_database(&state.pool).await;
    let status = database.status;

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    if status == HealthStatus::Unhealthy {
        tracing::warn!(error = ?database.error, "Database unreachable");
    }

    let response = HealthResponse {
        status,
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    };

    (status_code, Json(response))
}

async fn check_database(pool: &PgPool) -> DatabaseHealth {
    let start = Instant::now();
    let result = sqlx::query("SELECT 1").execute(pool).await;

    let (status, error) = match result {
        Ok(_) => (HealthStatus::Healthy, None),
        Err(e) => (HealthStatus::Unhealthy, Some(format!("Database error: {}", e))),
    };

    DatabaseHealth {
        status,
        response_time_ms: start.elapsed().as_millis(),
        pool_size: pool.size(),
        idle_connections: pool.num_idle(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;

    #[tokio::test]
    async fn test_unreachable_database_reports_unavailable() {
        let (status, Json(response)) = health_check(State(test_state("secret"))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status, HealthStatus::Unhealthy);
        assert_eq!(response.database.status, HealthStatus::Unhealthy);
        assert!(response.database.error.is_some());
        assert_eq!(response.database.idle_connections, 0);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert!(json["database"]["poolSize"].is_number());
    }
}
