use chrono::{NaiveDate, NaiveDateTime};

use super::StoreError;

pub(super) fn format_checkpoint(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accepts a plain date or a full ISO datetime as written by older pipelines.
pub fn parse_checkpoint(raw: &str) -> Result<NaiveDate, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Checkpoint("checkpoint file is empty".into()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.date())
        .map_err(|e| StoreError::Checkpoint(format!("'{}': {}", trimmed, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(
            parse_checkpoint("2024-01-10\n").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_parse_datetime() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(parse_checkpoint("2024-01-10T00:00:00").unwrap(), expected);
        assert_eq!(parse_checkpoint("2024-01-10T14:30:00.125").unwrap(), expected);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_checkpoint("yesterday"), Err(StoreError::Checkpoint(_))));
        assert!(matches!(parse_checkpoint("  "), Err(StoreError::Checkpoint(_))));
    }
}
