use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use tokio::time::{sleep as async_sleep, Duration};
use tracing::{error, info, warn};

use crate::errors::UpdateError;
use crate::external::price_provider::{PriceProvider, RawPriceRow};
use crate::models::{MergeSummary, PriceRecord, PriceTable};
use crate::store::{PriceStore, StoreError};

/// Result of a successful backfill.
#[derive(Debug, Clone)]
pub struct BackfillReport {
    pub table: PriceTable,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub checkpoint: NaiveDate,
    pub dropped_rows: usize,
}

/// Result of an incremental update run.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// Nothing new to merge; table and checkpoint untouched.
    UpToDate { checkpoint: NaiveDate },
    Merged(MergeReport),
}

#[derive(Debug, Clone)]
pub struct MergeReport {
    pub table: PriceTable,
    pub fetched: usize,
    pub dropped_rows: usize,
    pub summary: MergeSummary,
    pub previous_checkpoint: NaiveDate,
    pub checkpoint: NaiveDate,
}

/// The single writer of the persisted price table.
///
/// Persistence order is table first, checkpoint last: if a run dies in
/// between, the next run refetches the same window and the upsert absorbs it.
pub struct UpdaterService {
    provider: Arc<dyn PriceProvider>,
    store: PriceStore,
    ticker: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl UpdaterService {
    pub fn new(provider: Arc<dyn PriceProvider>, store: PriceStore, ticker: impl Into<String>) -> Self {
        Self {
            provider,
            store,
            ticker: ticker.into(),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(5),
        }
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub async fn backfill(&self, lookback_years: u32) -> Result<BackfillReport, UpdateError> {
        self.backfill_as_of(lookback_years, Utc::now().date_naive()).await
    }

    /// Fetches `lookback_years * 365` days ending at the last completed
    /// session before `today` and replaces both the backup and the live table.
    pub async fn backfill_as_of(
        &self,
        lookback_years: u32,
        today: NaiveDate,
    ) -> Result<BackfillReport, UpdateError> {
        let end = last_completed_session(today);
        let start = end
            .checked_sub_days(Days::new(u64::from(lookback_years) * 365))
            .ok_or_else(|| UpdateError::Validation(format!("lookback of {} years is out of range", lookback_years)))?;

        info!("🔄 Creating historical backup for {} ({} to {})", self.ticker, start, end);

        let rows = self.fetch_with_retry(start, end).await?;
        if rows.is_empty() {
            error!("❌ Provider {} returned no data for {}", self.provider.name(), self.ticker);
            return Err(UpdateError::Fetch(format!(
                "no data returned for {} between {} and {}",
                self.ticker, start, end
            )));
        }

        let (records, dropped_rows) = validate_rows(rows)?;
        let table = PriceTable::from_records(records);
        let checkpoint = table
            .latest_date()
            .ok_or_else(|| UpdateError::Validation("backfill produced an empty table".into()))?;

        let table = self
            .with_store(move |store| {
                store.write_backup(&table)?;
                store.write_daily(&table)?;
                store.write_checkpoint(checkpoint)?;
                Ok(table)
            })
            .await?;

        info!(
            "✅ Backup complete: {} records, {} to {}",
            table.len(),
            table.first().map(|r| r.date).unwrap_or(checkpoint),
            checkpoint
        );

        Ok(BackfillReport {
            table,
            start,
            end,
            checkpoint,
            dropped_rows,
        })
    }

    pub async fn incremental_update(&self) -> Result<UpdateOutcome, UpdateError> {
        self.incremental_update_as_of(Utc::now().date_naive()).await
    }

    /// Fetches `checkpoint + 1 ..= last completed session before today` and
    /// upserts it into the live table.
    ///
    /// The current day is never fetched, so a bar is only stored once its
    /// session has closed.
    pub async fn incremental_update_as_of(&self, today: NaiveDate) -> Result<UpdateOutcome, UpdateError> {
        let checkpoint = self.with_store(|store| store.read_checkpoint()).await?.ok_or_else(|| {
            warn!("⚠️ No checkpoint found in {}", self.store.data_dir().display());
            UpdateError::NoBackup
        })?;

        info!("📅 Last update: {}", checkpoint);

        let end = last_completed_session(today);
        let Some(start) = checkpoint.succ_opt().filter(|start| *start <= end) else {
            info!("✓ Data already up to date ({}, last session {})", checkpoint, end);
            return Ok(UpdateOutcome::UpToDate { checkpoint });
        };

        let rows = self.fetch_with_retry(start, end).await?;
        if rows.is_empty() {
            info!("✓ No new trading days between {} and {}", start, end);
            return Ok(UpdateOutcome::UpToDate { checkpoint });
        }

        let (records, dropped_rows) = validate_rows(rows)?;
        let fetched = records.len();

        let merged = self
            .with_store(move |store| {
                let Some(mut table) = store.load_table()? else {
                    return Ok(None);
                };
                let summary = table.upsert(records);
                // checkpoint always tracks the newest stored date
                let new_checkpoint = table.latest_date().unwrap_or(checkpoint);
                store.write_daily(&table)?;
                store.write_checkpoint(new_checkpoint)?;
                Ok(Some((table, summary, new_checkpoint)))
            })
            .await?;

        let Some((table, summary, new_checkpoint)) = merged else {
            warn!("⚠️ Checkpoint {} exists but no table file was found", checkpoint);
            return Err(UpdateError::NoBackup);
        };

        info!(
            "✅ Merged {} fetched records (new: {}, revised: {}, unchanged: {}), total {}",
            fetched, summary.inserted, summary.revised, summary.unchanged, summary.total_records
        );

        Ok(UpdateOutcome::Merged(MergeReport {
            table,
            fetched,
            dropped_rows,
            summary,
            previous_checkpoint: checkpoint,
            checkpoint: new_checkpoint,
        }))
    }

    /// Runs file I/O on the blocking pool.
    async fn with_store<T, F>(&self, op: F) -> Result<T, UpdateError>
    where
        T: Send + 'static,
        F: FnOnce(&PriceStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| UpdateError::Task(e.to_string()))?
            .map_err(UpdateError::from)
    }

    async fn fetch_with_retry(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawPriceRow>, UpdateError> {
        info!("📥 Fetching {} from {} ({} to {})", self.ticker, self.provider.name(), start, end);

        let mut retry_count = 0;
        loop {
            match self.provider.fetch_daily_prices(&self.ticker, start, end).await {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_transient() && retry_count < self.max_retries => {
                    retry_count += 1;
                    let delay = self.retry_base_delay * retry_count;
                    warn!(
                        "Fetch for {} failed ({}), retrying in {}s (attempt {}/{})",
                        self.ticker,
                        e,
                        delay.as_secs(),
                        retry_count,
                        self.max_retries
                    );
                    async_sleep(delay).await;
                }
                Err(e) => {
                    error!("✗ Failed to fetch price data for {}: {}", self.ticker, e);
                    return Err(e.into());
                }
            }
        }
    }
}

/// The most recent weekday strictly before `today`. Sessions for a date are
/// complete once that UTC day has ended.
pub fn last_completed_session(today: NaiveDate) -> NaiveDate {
    let mut day = today.pred_opt().unwrap_or(today);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day = day.pred_opt().unwrap_or(day);
    }
    day
}

/// Turns provider rows into records, dropping rows with a missing or
/// non-finite price. Fails only if every row was dropped.
pub fn validate_rows(rows: Vec<RawPriceRow>) -> Result<(Vec<PriceRecord>, usize), UpdateError> {
    let total = rows.len();
    let mut records = Vec::with_capacity(total);
    let mut dropped = 0;

    for row in rows {
        let record = match (row.high, row.low, row.close) {
            (Some(high), Some(low), Some(close)) => PriceRecord::from_f64(row.date, high, low, close),
            _ => None,
        };
        match record {
            Some(record) => records.push(record),
            None => {
                dropped += 1;
                warn!(
                    "Dropping row {}: high={:?} low={:?} close={:?}",
                    row.date, row.high, row.low, row.close
                );
            }
        }
    }

    if records.is_empty() && total > 0 {
        return Err(UpdateError::Validation(format!(
            "all {} fetched rows are missing required fields",
            total
        )));
    }

    Ok((records, dropped))
}
