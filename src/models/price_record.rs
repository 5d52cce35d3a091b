use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of decimal places every stored price is normalised to.
pub const PRICE_SCALE: i64 = 4;

/// One trading day of gold prices. `date` is the unique key of a `PriceTable`.
///
/// `min_price <= closed_price <= max_price` is expected from the provider but
/// deliberately not enforced: gap days occasionally violate it upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    #[serde(with = "super::decimal")]
    pub max_price: BigDecimal,
    #[serde(with = "super::decimal")]
    pub min_price: BigDecimal,
    #[serde(with = "super::decimal")]
    pub closed_price: BigDecimal,
}

impl PriceRecord {
    pub fn new(
        date: NaiveDate,
        max_price: BigDecimal,
        min_price: BigDecimal,
        closed_price: BigDecimal,
    ) -> Self {
        Self {
            date,
            max_price: normalize_price(max_price),
            min_price: normalize_price(min_price),
            closed_price: normalize_price(closed_price),
        }
    }

    /// Builds a record from provider floats, `None` if any value is not finite.
    pub fn from_f64(date: NaiveDate, max_price: f64, min_price: f64, closed_price: f64) -> Option<Self> {
        Some(Self {
            date,
            max_price: price_from_f64(max_price)?,
            min_price: price_from_f64(min_price)?,
            closed_price: price_from_f64(closed_price)?,
        })
    }
}

/// Rounds half-even to `PRICE_SCALE` places and pins the scale, so that equal
/// prices always have identical representations on disk.
pub fn normalize_price(value: BigDecimal) -> BigDecimal {
    value.round(PRICE_SCALE).with_scale(PRICE_SCALE)
}

pub fn price_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::try_from(value).ok().map(normalize_price)
}
