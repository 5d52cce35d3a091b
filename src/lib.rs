//! Daily gold price pipeline: a single-writer updater that backfills and
//! incrementally merges provider data into a Parquet table, and a read-only
//! HTTP API over an in-memory snapshot of that table.

pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod jobs;
pub mod logging;
pub mod models;
mod routes;
pub mod services;
pub mod state;
pub mod store;
