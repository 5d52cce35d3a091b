use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(service_info))
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub route: &'static str,
    pub description: &'static str,
}

async fn service_info() -> Json<ServiceInfo> {
    info!("GET / - Service info");
    Json(ServiceInfo {
        message: "Gold Price API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointInfo { route: "GET /health", description: "Service health and data availability" },
            EndpointInfo { route: "GET /prices", description: "Paginated prices, newest first (offset, limit)" },
            EndpointInfo { route: "GET /prices/latest", description: "Latest available price" },
            EndpointInfo { route: "GET /prices/date/{date}", description: "Price on a specific date (YYYY-MM-DD)" },
            EndpointInfo { route: "GET /prices/range", description: "Prices between start_date and end_date, inclusive" },
            EndpointInfo { route: "GET /stats", description: "Statistics over all stored prices" },
        ],
    })
}
