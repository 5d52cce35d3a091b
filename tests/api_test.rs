/// HTTP API tests
///
/// Drives the full router in-process with `tower::ServiceExt::oneshot`
/// against a three-day table:
///
/// | date       | max     | min     | close   |
/// |------------|---------|---------|---------|
/// | 2024-01-08 | 2035.00 | 2025.00 | 2030.00 |
/// | 2024-01-09 | 2040.00 | 2030.00 | 2035.25 |
/// | 2024-01-10 | 2045.50 | 2030.25 | 2042.75 |
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use gold_price_backend::app::create_app;
use gold_price_backend::models::{PriceRecord, PriceTable};
use gold_price_backend::services::table_handle::TableHandle;
use gold_price_backend::state::AppState;
use gold_price_backend::store::PriceStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn sample_table() -> PriceTable {
    PriceTable::from_records(vec![
        PriceRecord::from_f64(date(8), 2035.0, 2025.0, 2030.0).unwrap(),
        PriceRecord::from_f64(date(9), 2040.0, 2030.0, 2035.25).unwrap(),
        PriceRecord::from_f64(date(10), 2045.5, 2030.25, 2042.75).unwrap(),
    ])
}

fn app_with(table: PriceTable) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let handle = TableHandle::new(PriceStore::new(dir.path()));
    handle.replace(table);
    let state = AppState {
        table: Arc::new(handle),
        max_page_limit: 1000,
    };
    (create_app(state), dir)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn dates_of(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["date"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Service info and health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Gold Price API");
    assert!(body["endpoints"].as_array().unwrap().len() >= 6);
}

#[tokio::test]
async fn test_health_with_data() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["data_available"], true);
    assert_eq!(body["total_records"], 3);
    assert_eq!(body["last_update"], "2024-01-10");
}

#[tokio::test]
async fn test_health_without_data_is_unavailable() {
    let (app, _dir) = app_with(PriceTable::new());
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["data_available"], false);
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_latest_price() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app, "/prices/latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2024-01-10");
    assert_eq!(body["closed_price"].as_f64(), Some(2042.75));
    assert_eq!(body["max_price"].as_f64(), Some(2045.5));
}

#[tokio::test]
async fn test_latest_price_on_empty_table_is_404() {
    let (app, _dir) = app_with(PriceTable::new());
    let (status, body) = get(app, "/prices/latest").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_price_by_date() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app.clone(), "/prices/date/2024-01-09").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closed_price"].as_f64(), Some(2035.25));

    let (status, body) = get(app, "/prices/date/2024-01-07").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("2024-01-07"));
}

#[tokio::test]
async fn test_malformed_date_is_400() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app, "/prices/date/01-09-2024").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_list_is_newest_first_and_paginates() {
    let (app, _dir) = app_with(sample_table());

    let (status, body) = get(app.clone(), "/prices").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dates_of(&body), vec!["2024-01-10", "2024-01-09", "2024-01-08"]);

    let (_, first) = get(app.clone(), "/prices?offset=0&limit=2").await;
    let (_, second) = get(app.clone(), "/prices?offset=2&limit=2").await;
    assert_eq!(dates_of(&first), vec!["2024-01-10", "2024-01-09"]);
    assert_eq!(dates_of(&second), vec!["2024-01-08"]);

    let (_, skipped) = get(app, "/prices?skip=1&limit=1").await;
    assert_eq!(dates_of(&skipped), vec!["2024-01-09"]);
}

#[tokio::test]
async fn test_list_on_empty_table_is_empty_array() {
    let (app, _dir) = app_with(PriceTable::new());
    let (status, body) = get(app, "/prices").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_range_is_inclusive_and_ascending() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app.clone(), "/prices/range?start_date=2024-01-08&end_date=2024-01-09").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(dates_of(&body), vec!["2024-01-08", "2024-01-09"]);

    let (status, body) = get(app, "/prices/range?start_date=2024-02-01&end_date=2024-02-05").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_inverted_range_is_400() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app, "/prices/range?start_date=2024-01-10&end_date=2024-01-08").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_bad_query_params_are_400_with_detail() {
    let (app, _dir) = app_with(sample_table());

    for uri in [
        "/prices/range?start_date=2024-01-08",
        "/prices/range?start_date=2024-01-08&end_date=Jan-09",
        "/prices?limit=-1",
        "/prices?offset=abc",
    ] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["detail"].is_string(), "{} -> {}", uri, body);
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stats() {
    let (app, _dir) = app_with(sample_table());
    let (status, body) = get(app, "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_records"], 3);
    assert_eq!(body["date_range_start"], "2024-01-08");
    assert_eq!(body["date_range_end"], "2024-01-10");
    assert_eq!(body["avg_closed_price"].as_f64(), Some(2036.0));
    assert_eq!(body["max_closed_price"].as_f64(), Some(2042.75));
    assert_eq!(body["min_closed_price"].as_f64(), Some(2030.0));
}

#[tokio::test]
async fn test_stats_on_empty_table_is_404() {
    let (app, _dir) = app_with(PriceTable::new());
    let (status, _) = get(app, "/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
