//! Liveness and database readiness check, mounted outside `/api/v1`.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::error_response;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub status: &'static str,
    pub version: &'static str,
    /// Round trip of `SELECT 1`, in milliseconds.
    pub database_latency_ms: u64,
}

/// GET /health
///
/// 200 with the service envelope while PostgreSQL answers, otherwise 503
/// with the error envelope.
async fn health(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    match fixit_db::health_check(&state.pool).await {
        Ok(()) => {
            let latency = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            Json(ApiResponse::data(ServiceHealth {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                database_latency_ms: latency,
            }))
            .into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Health check could not reach the database");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "DATABASE_UNAVAILABLE",
                "Database is unreachable".to_string(),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
