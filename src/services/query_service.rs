//! Read-only queries over a table snapshot. Every function is pure: the caller
//! hands in the snapshot it took at the start of the request.

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::{PriceRecord, PriceStats, PriceTable};

pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Newest first. `limit` is clamped to `max_limit`; an `offset` past the end
/// yields an empty page.
pub fn list_prices(table: &PriceTable, offset: usize, limit: usize, max_limit: usize) -> Vec<PriceRecord> {
    table
        .records()
        .iter()
        .rev()
        .skip(offset)
        .take(limit.min(max_limit))
        .cloned()
        .collect()
}

pub fn latest_price(table: &PriceTable) -> Result<PriceRecord, AppError> {
    table
        .latest()
        .cloned()
        .ok_or_else(|| AppError::NotFound("No price data available".to_string()))
}

pub fn price_for_date(table: &PriceTable, date: NaiveDate) -> Result<PriceRecord, AppError> {
    table
        .get(date)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No data found for date {}", date)))
}

/// Inclusive on both ends, ascending.
pub fn price_range(table: &PriceTable, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceRecord>, AppError> {
    if start > end {
        return Err(AppError::InvalidRange(format!(
            "start_date {} is after end_date {}",
            start, end
        )));
    }
    Ok(table.range(start, end).to_vec())
}

pub fn stats(table: &PriceTable) -> Result<PriceStats, AppError> {
    PriceStats::compute(table).ok_or_else(|| AppError::NotFound("No price data available".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn example_table() -> PriceTable {
        PriceTable::from_records(vec![
            PriceRecord::from_f64(date(2024, 1, 8), 2035.0, 2025.0, 2030.0).unwrap(),
            PriceRecord::from_f64(date(2024, 1, 9), 2040.0, 2030.0, 2035.25).unwrap(),
            PriceRecord::from_f64(date(2024, 1, 10), 2045.5, 2030.25, 2042.75).unwrap(),
        ])
    }

    /// One record per calendar day starting 2023-01-01.
    fn long_table(days: u64) -> PriceTable {
        let start = date(2023, 1, 1);
        PriceTable::from_records(
            (0..days)
                .map(|i| {
                    let d = start + chrono::Days::new(i);
                    PriceRecord::from_f64(d, 1900.0 + i as f64, 1800.0, 1850.0 + i as f64).unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn test_latest_price() {
        let latest = latest_price(&example_table()).unwrap();
        assert_eq!(latest.date, date(2024, 1, 10));
        assert!(matches!(latest_price(&PriceTable::new()), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_price_for_date() {
        let table = example_table();
        let record = price_for_date(&table, date(2024, 1, 9)).unwrap();
        assert_eq!(record.closed_price, BigDecimal::from_str("2035.25").unwrap());

        // Sunday
        assert!(matches!(price_for_date(&table, date(2024, 1, 7)), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_price_range_example() {
        let records = price_range(&example_table(), date(2024, 1, 8), date(2024, 1, 9)).unwrap();
        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 8), date(2024, 1, 9)]);
    }

    #[test]
    fn test_price_range_rejects_inverted_bounds() {
        let result = price_range(&example_table(), date(2024, 1, 10), date(2024, 1, 8));
        assert!(matches!(result, Err(AppError::InvalidRange(_))));
    }

    #[test]
    fn test_price_range_without_trading_days_is_empty() {
        let records = price_range(&example_table(), date(2024, 1, 6), date(2024, 1, 7)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_price_range_matches_filter_for_every_window() {
        let table = long_table(40);
        let first = date(2022, 12, 25);
        for s in 0..50u64 {
            for len in 0..12u64 {
                let start = first + chrono::Days::new(s);
                let end = start + chrono::Days::new(len);
                let expected: Vec<_> = table
                    .records()
                    .iter()
                    .filter(|r| r.date >= start && r.date <= end)
                    .cloned()
                    .collect();
                assert_eq!(price_range(&table, start, end).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_pages_are_contiguous_newest_first() {
        let table = long_table(25);
        let n = 10;
        let first = list_prices(&table, 0, n, MAX_PAGE_LIMIT);
        let second = list_prices(&table, n, n, MAX_PAGE_LIMIT);

        let combined: Vec<_> = first.into_iter().chain(second).collect();
        let expected: Vec<_> = table.records().iter().rev().take(2 * n).cloned().collect();
        assert_eq!(combined, expected);
    }

    #[test]
    fn test_list_clamps_limit_and_handles_large_offset() {
        let table = long_table(30);
        assert_eq!(list_prices(&table, 0, 5000, 20).len(), 20);
        assert!(list_prices(&table, 30, 10, MAX_PAGE_LIMIT).is_empty());
        assert!(list_prices(&table, 1000, 10, MAX_PAGE_LIMIT).is_empty());
        assert_eq!(list_prices(&table, 28, 10, MAX_PAGE_LIMIT).len(), 2);
    }

    #[test]
    fn test_stats_example_and_empty() {
        let s = stats(&example_table()).unwrap();
        assert_eq!(s.total_records, 3);
        assert_eq!(s.avg_closed_price, BigDecimal::from_str("2036").unwrap());
        assert!(matches!(stats(&PriceTable::new()), Err(AppError::NotFound(_))));
    }
}
