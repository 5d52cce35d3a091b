use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::PriceStats;
use crate::services::query_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<PriceStats>, AppError> {
    info!("GET /stats - Getting price statistics");
    let snapshot = state.table.snapshot();
    let stats = query_service::stats(&snapshot.table).map_err(|e| {
        warn!("No statistics available: {}", e);
        e
    })?;
    Ok(Json(stats))
}
