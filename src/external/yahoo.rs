use std::time::Duration;

use crate::external::price_provider::{PriceProvider, PriceProviderError, RawPriceRow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance chart API provider. No API key required.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    /// `timeout` bounds every request end to end.
    pub fn new(timeout: Duration) -> Result<Self, PriceProviderError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; GoldPrice/0.1)")
            .timeout(timeout)
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_chart(body: YahooChartResponse) -> Result<Vec<RawPriceRow>, PriceProviderError> {
    if let Some(error) = body.chart.error {
        // Yahoo answers a data-free window with an error object
        if error.description.contains("No data found") {
            return Ok(Vec::new());
        }
        if error.code == "Not Found" {
            return Err(PriceProviderError::NotFound);
        }
        return Err(PriceProviderError::BadResponse(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| PriceProviderError::BadResponse("missing result".into()))?;

    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| PriceProviderError::BadResponse("missing quote".into()))?;

    let mut rows = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        // Bars are stamped at exchange midnight; shift into exchange time
        // before taking the calendar date.
        let date = chrono::DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| PriceProviderError::Parse(format!("bad timestamp {}", ts)))?;

        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();

        // Holidays come back as all-null bars
        if high.is_none() && low.is_none() && close.is_none() {
            continue;
        }

        rows.push(RawPriceRow { date, high, low, close });
    }

    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    async fn fetch_daily_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawPriceRow>, PriceProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| PriceProviderError::Parse(format!("bad start date {}", start)))?;
        let period2 = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| PriceProviderError::Parse(format!("bad end date {}", end)))?;

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PriceProviderError::Timeout(e.to_string())
                } else {
                    PriceProviderError::Network(e.to_string())
                }
            })?;

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(PriceProviderError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => return Err(PriceProviderError::NotFound),
            status if !status.is_success() => {
                return Err(PriceProviderError::BadResponse(format!("HTTP {}", status)))
            }
            _ => {}
        }

        let body = resp.json::<YahooChartResponse>().await.map_err(|e| {
            if e.is_timeout() {
                PriceProviderError::Timeout(e.to_string())
            } else {
                PriceProviderError::Parse(e.to_string())
            }
        })?;

        let rows = parse_chart(body)?;
        // period2 is inclusive of the whole end day, trim anything past it
        Ok(rows
            .into_iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect())
    }
}
