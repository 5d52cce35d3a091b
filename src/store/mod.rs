//! File-backed persistence for the price table and the update checkpoint.
//!
//! Layout under the data directory:
//! - `gold_backup.parquet`: table as written by the last backfill
//! - `gold_daily.parquet`: live table, rewritten by backfill and every update
//! - `last_update.txt`: ISO-8601 date of the latest merged record
//!
//! Every write goes to a `.tmp` sibling first and is renamed into place, so a
//! reader never opens a half-written file.

mod checkpoint;
mod parquet;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::PriceTable;

pub use checkpoint::parse_checkpoint;

pub const BACKUP_FILE: &str = "gold_backup.parquet";
pub const DAILY_FILE: &str = "gold_daily.parquet";
pub const CHECKPOINT_FILE: &str = "last_update.txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("invalid table file {path}: {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("invalid checkpoint: {0}")]
    Checkpoint(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PriceStore {
    data_dir: PathBuf,
}

impl PriceStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_path(&self) -> PathBuf {
        self.data_dir.join(BACKUP_FILE)
    }

    pub fn daily_path(&self) -> PathBuf {
        self.data_dir.join(DAILY_FILE)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join(CHECKPOINT_FILE)
    }

    /// Loads the live table, falling back to the backup. `None` when neither
    /// file exists yet.
    pub fn load_table(&self) -> Result<Option<PriceTable>, StoreError> {
        let daily = self.daily_path();
        if daily.exists() {
            return parquet::read_table(&daily).map(Some);
        }

        let backup = self.backup_path();
        if backup.exists() {
            warn!("Live table {} missing, serving backup {}", daily.display(), backup.display());
            return parquet::read_table(&backup).map(Some);
        }

        Ok(None)
    }

    pub fn write_backup(&self, table: &PriceTable) -> Result<(), StoreError> {
        self.write_table(&self.backup_path(), table)
    }

    pub fn write_daily(&self, table: &PriceTable) -> Result<(), StoreError> {
        self.write_table(&self.daily_path(), table)
    }

    pub fn read_checkpoint(&self) -> Result<Option<NaiveDate>, StoreError> {
        let path = self.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        parse_checkpoint(&raw).map(Some)
    }

    pub fn write_checkpoint(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.checkpoint_path();
        write_atomic(&path, |tmp| {
            fs::write(tmp, checkpoint::format_checkpoint(date)).map_err(|e| StoreError::io(tmp, e))
        })?;
        info!("Checkpoint updated: {}", date);
        Ok(())
    }

    fn write_table(&self, path: &Path, table: &PriceTable) -> Result<(), StoreError> {
        self.ensure_dir()?;
        write_atomic(path, |tmp| parquet::write_table(tmp, table))?;
        info!("Saved {} records to {}", table.len(), path.display());
        Ok(())
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| StoreError::io(&self.data_dir, e))
    }
}

fn write_atomic<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&Path) -> Result<(), StoreError>,
{
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(e) = write(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::io(path, e)
    })
}
