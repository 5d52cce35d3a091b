use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::PriceRecord;

/// Date-ordered collection of daily prices.
///
/// Records are kept ascending by date with at most one record per date.
/// Non-trading days are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    records: Vec<PriceRecord>,
}

/// What an upsert did to the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub inserted: usize,
    pub revised: usize,
    pub unchanged: usize,
    pub total_records: usize,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from unordered records. When a date repeats, the record
    /// appearing last wins.
    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        let mut table = Self::new();
        table.upsert(records);
        table
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&PriceRecord> {
        self.records.first()
    }

    pub fn latest(&self) -> Option<&PriceRecord> {
        self.records.last()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.latest().map(|r| r.date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PriceRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Records with `start <= date <= end`, ascending. Empty when `start > end`.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> &[PriceRecord] {
        if start > end {
            return &[];
        }
        let lo = self.records.partition_point(|r| r.date < start);
        let hi = self.records.partition_point(|r| r.date <= end);
        &self.records[lo..hi]
    }

    /// Upsert-by-date: new dates are inserted, existing dates are overwritten
    /// by the incoming record. Revision scope is unbounded, any date in the
    /// batch replaces what is stored.
    pub fn upsert(&mut self, incoming: Vec<PriceRecord>) -> MergeSummary {
        let mut by_date: BTreeMap<NaiveDate, PriceRecord> = std::mem::take(&mut self.records)
            .into_iter()
            .map(|r| (r.date, r))
            .collect();

        let mut summary = MergeSummary::default();
        for record in incoming {
            match by_date.insert(record.date, record.clone()) {
                None => summary.inserted += 1,
                Some(previous) if previous == record => summary.unchanged += 1,
                Some(_) => summary.revised += 1,
            }
        }

        self.records = by_date.into_values().collect();
        summary.total_records = self.records.len();
        summary
    }
}
