use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{normalize_price, PriceTable};

/// Aggregate view over the whole table, as served by `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub total_records: usize,
    pub date_range_start: NaiveDate,
    pub date_range_end: NaiveDate,
    #[serde(with = "super::decimal")]
    pub avg_closed_price: BigDecimal,
    #[serde(with = "super::decimal")]
    pub max_closed_price: BigDecimal,
    #[serde(with = "super::decimal")]
    pub min_closed_price: BigDecimal,
}

impl PriceStats {
    /// `None` for an empty table.
    pub fn compute(table: &PriceTable) -> Option<Self> {
        let first = table.first()?;
        let last = table.latest()?;
        let closes = table.records().iter().map(|r| &r.closed_price);

        let sum = closes.clone().fold(BigDecimal::zero(), |acc, p| acc + p);
        let max = closes.clone().max()?.clone();
        let min = closes.min()?.clone();
        let avg = sum / BigDecimal::from(table.len() as u64);

        Some(Self {
            total_records: table.len(),
            date_range_start: first.date,
            date_range_end: last.date,
            avg_closed_price: normalize_price(avg),
            max_closed_price: max,
            min_closed_price: min,
        })
    }
}
