use std::path::PathBuf;
use std::time::Duration;

use crate::services::query_service::MAX_PAGE_LIMIT;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub ticker: String,
    pub backup_years: u32,
    pub api_host: String,
    pub api_port: u16,
    pub fetch_timeout: Duration,
    pub fetch_max_retries: u32,
    pub table_reload_schedule: Option<String>,
    pub update_schedule: Option<String>,
    pub max_page_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dataset"),
            ticker: "GC=F".to_string(),
            backup_years: 3,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            fetch_timeout: Duration::from_secs(30),
            fetch_max_retries: 2,
            table_reload_schedule: Some("0 */5 * * * *".to_string()),
            update_schedule: None,
            max_page_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl AppConfig {
    /// Reads the environment (call `dotenvy::dotenv()` first to pick up `.env`).
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            ticker: std::env::var("GOLD_TICKER").unwrap_or(defaults.ticker),
            backup_years: parse_var("BACKUP_YEARS").unwrap_or(defaults.backup_years),
            api_host: std::env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_var("API_PORT").unwrap_or(defaults.api_port),
            fetch_timeout: parse_var("FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            fetch_max_retries: parse_var("FETCH_MAX_RETRIES").unwrap_or(defaults.fetch_max_retries),
            table_reload_schedule: optional_var("TABLE_RELOAD_SCHEDULE", defaults.table_reload_schedule),
            update_schedule: optional_var("UPDATE_SCHEDULE", defaults.update_schedule),
            max_page_limit: parse_var("MAX_PAGE_LIMIT").unwrap_or(defaults.max_page_limit),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ticker.trim().is_empty() {
            return Err("GOLD_TICKER must not be empty".to_string());
        }
        if self.backup_years == 0 {
            return Err("BACKUP_YEARS must be at least 1".to_string());
        }
        if self.fetch_timeout.is_zero() {
            return Err("FETCH_TIMEOUT_SECS must be at least 1".to_string());
        }
        if self.max_page_limit == 0 {
            return Err("MAX_PAGE_LIMIT must be at least 1".to_string());
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Set to an empty string or `off` to disable.
fn optional_var(name: &str, default: Option<String>) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if v.trim().is_empty() || v.trim().eq_ignore_ascii_case("off") => None,
        Ok(v) => Some(v.trim().to_string()),
        Err(_) => default,
    }
}
