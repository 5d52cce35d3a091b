use axum::{extract::State, routing::get, Json, Router};
use http::StatusCode;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// 200 while a non-empty table is being served, 503 otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    info!("GET /health - Health check");
    let snapshot = state.table.snapshot();

    match snapshot.table.latest() {
        Some(latest) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "data_available": true,
                "total_records": snapshot.table.len(),
                "last_update": latest.date,
                "loaded_at": snapshot.loaded_at,
            })),
        ),
        None => {
            warn!("Health check: no price data loaded");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "data_available": false,
                    "error": "No data available. Run the backfill first.",
                })),
            )
        }
    }
}
