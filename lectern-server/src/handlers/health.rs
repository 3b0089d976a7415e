use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_time: DateTime<Utc>,
}

/// Database liveness probe. Clients use this as their one-shot
/// reachability check before enabling remote progress sync.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, String)> {
    match state.progress.health_check().await {
        Ok(db_time) => Ok(Json(HealthResponse {
            status: "ok".to_string(),
            db_time,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Database unavailable: {}", e),
        )),
    }
}
