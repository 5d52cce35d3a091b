use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// A daily row as delivered by a market-data provider, before validation.
/// Any price field may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPriceRow {
    pub date: NaiveDate,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("ticker not found")]
    NotFound,
}

impl PriceProviderError {
    /// Errors worth another attempt within the same update run. Timeouts are
    /// excluded: they end the run.
    pub fn is_transient(&self) -> bool {
        matches!(self, PriceProviderError::Network(_) | PriceProviderError::RateLimited)
    }
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily rows for `ticker` with `start <= date <= end`, ascending.
    /// A valid range without trading days yields `Ok(vec![])`.
    async fn fetch_daily_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawPriceRow>, PriceProviderError>;
}
