use axum::Router;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{health, prices, root, stats};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::<AppState>::new()
        .merge(root::router())
        .nest("/health", health::router())
        .nest("/stats", stats::router())
        .nest("/prices", prices::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
