use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::PriceRecord;
use crate::services::query_service::{self, DEFAULT_PAGE_LIMIT};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_prices))
        .route("/latest", get(get_latest_price))
        .route("/date/:date", get(get_price_by_date))
        .route("/range", get(get_prices_by_range))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default, alias = "skip")]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start_date: String,
    pub end_date: String,
}

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

pub async fn list_prices(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<PriceRecord>>, AppError> {
    let Query(params) = params?;
    info!("GET /prices?offset={}&limit={} - Listing prices", params.offset, params.limit);
    let snapshot = state.table.snapshot();
    Ok(Json(query_service::list_prices(
        &snapshot.table,
        params.offset,
        params.limit,
        state.max_page_limit,
    )))
}

pub async fn get_latest_price(State(state): State<AppState>) -> Result<Json<PriceRecord>, AppError> {
    info!("GET /prices/latest - Getting latest price");
    let snapshot = state.table.snapshot();
    let record = query_service::latest_price(&snapshot.table).map_err(|e| {
        warn!("Latest price unavailable: {}", e);
        e
    })?;
    Ok(Json(record))
}

pub async fn get_price_by_date(
    Path(date): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PriceRecord>, AppError> {
    info!("GET /prices/date/{} - Getting price for date", date);
    let date = parse_date(&date)?;
    let snapshot = state.table.snapshot();
    let record = query_service::price_for_date(&snapshot.table, date)?;
    Ok(Json(record))
}

pub async fn get_prices_by_range(
    State(state): State<AppState>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<PriceRecord>>, AppError> {
    let Query(params) = params?;
    info!(
        "GET /prices/range?start_date={}&end_date={} - Getting price range",
        params.start_date, params.end_date
    );
    let start = parse_date(&params.start_date)?;
    let end = parse_date(&params.end_date)?;
    let snapshot = state.table.snapshot();
    let records = query_service::price_range(&snapshot.table, start, end)
        .map_err(|e| {
            warn!("Rejected price range: {}", e);
            e
        })?;
    Ok(Json(records))
}
