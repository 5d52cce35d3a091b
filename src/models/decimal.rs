//! Serde helpers that put `BigDecimal` prices on the wire as JSON numbers.
//!
//! The `serde` feature of `bigdecimal` renders values as strings, which breaks
//! clients that expect `"closed_price": 2042.75`. Prices are kept at a fixed
//! scale internally, so the `f64` conversion only happens at the boundary.

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{de, Deserialize, Deserializer, Serializer};

use super::price_record::price_from_f64;

pub fn serialize<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value.to_f64() {
        Some(v) => serializer.serialize_f64(v),
        None => Err(serde::ser::Error::custom(format!(
            "price {} does not fit in a JSON number",
            value
        ))),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    price_from_f64(raw).ok_or_else(|| de::Error::custom(format!("invalid price: {}", raw)))
}
