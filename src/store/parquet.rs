use std::fs;
use std::path::Path;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use super::StoreError;
use crate::models::{price_from_f64, PriceRecord, PriceTable, PRICE_SCALE};

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the origin of Arrow `Date`.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const PRICE_PRECISION: usize = 18;

pub(super) fn write_table(path: &Path, table: &PriceTable) -> Result<(), StoreError> {
    let mut df = table_to_dataframe(table)?;
    let file = fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| StoreError::Parquet(format!("write {}: {e}", path.display())))?;
    Ok(())
}

pub(super) fn read_table(path: &Path) -> Result<PriceTable, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| StoreError::Parquet(format!("read {}: {e}", path.display())))?;

    let schema_err = |reason: String| StoreError::Schema {
        path: path.to_path_buf(),
        reason,
    };

    let dates = df
        .column("date")
        .and_then(|c| c.cast(&DataType::Date))
        .map_err(|e| schema_err(format!("date column: {e}")))?;
    let date_ca = dates
        .date()
        .map_err(|e| schema_err(format!("date column type: {e}")))?;

    let max_prices = price_values(&df, "max_price")
        .map_err(|e| schema_err(format!("max_price column: {e}")))?;
    let min_prices = price_values(&df, "min_price")
        .map_err(|e| schema_err(format!("min_price column: {e}")))?;
    let closed_prices = price_values(&df, "closed_price")
        .map_err(|e| schema_err(format!("closed_price column: {e}")))?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| schema_err(format!("null date at row {i}")))?;
        let date = NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
            .ok_or_else(|| schema_err(format!("date out of range at row {i}")))?;

        let price = |values: &[Option<BigDecimal>], name: &str| {
            values
                .get(i)
                .cloned()
                .flatten()
                .ok_or_else(|| schema_err(format!("invalid {name} at row {i}")))
        };

        records.push(PriceRecord::new(
            date,
            price(&max_prices, "max_price")?,
            price(&min_prices, "min_price")?,
            price(&closed_prices, "closed_price")?,
        ));
    }

    Ok(PriceTable::from_records(records))
}

fn table_to_dataframe(table: &PriceTable) -> Result<DataFrame, StoreError> {
    let records = table.records();
    let dates: Vec<i32> = records
        .iter()
        .map(|r| r.date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();

    let decimal = |name: &str, values: Vec<String>| {
        Column::new(name.into(), values)
            .cast(&DataType::Decimal(Some(PRICE_PRECISION), Some(PRICE_SCALE as usize)))
            .map_err(|e| StoreError::Parquet(format!("{name} cast: {e}")))
    };

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| StoreError::Parquet(format!("date cast: {e}")))?,
        decimal(
            "max_price",
            records.iter().map(|r| r.max_price.to_string()).collect(),
        )?,
        decimal(
            "min_price",
            records.iter().map(|r| r.min_price.to_string()).collect(),
        )?,
        decimal(
            "closed_price",
            records.iter().map(|r| r.closed_price.to_string()).collect(),
        )?,
    ])
    .map_err(|e| StoreError::Parquet(format!("dataframe creation: {e}")))
}

/// Reads a price column. Decimal columns are taken from their unscaled
/// `i128` values so no precision is lost; float columns from other writers go
/// through `price_from_f64`.
fn price_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<BigDecimal>>> {
    let column = df.column(name)?;
    if let DataType::Decimal(_, _) = column.dtype() {
        let ca = column.as_materialized_series().decimal()?;
        let scale = ca.scale() as i64;
        let unscaled: &ChunkedArray<Int128Type> = ca;
        return Ok(unscaled
            .into_iter()
            .map(|v| v.map(|v| BigDecimal::new(BigInt::from(v), scale)))
            .collect());
    }

    let floats = column.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().map(|v| v.and_then(price_from_f64)).collect())
}
