use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::info;

use crate::models::PriceTable;
use crate::store::{PriceStore, StoreError};

/// Immutable table served to requests, with the time it was loaded.
#[derive(Debug, Default)]
pub struct TableSnapshot {
    pub table: PriceTable,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Process-wide handle on the in-memory price table.
///
/// Requests take an `Arc` to the current snapshot and keep it for their whole
/// lifetime. A reload builds a complete new table off to the side and swaps the
/// `Arc` in, so readers see either the old table or the new one, never a mix.
///
/// Reload triggers:
/// - startup (`open`)
/// - the timed reload job
/// - a successful in-process update (`replace`)
pub struct TableHandle {
    store: PriceStore,
    current: RwLock<Arc<TableSnapshot>>,
}

impl TableHandle {
    pub fn new(store: PriceStore) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(TableSnapshot::default())),
        }
    }

    /// Creates the handle and performs the initial load.
    pub fn open(store: PriceStore) -> Result<Self, StoreError> {
        let handle = Self::new(store);
        handle.reload()?;
        Ok(handle)
    }

    pub fn snapshot(&self) -> Arc<TableSnapshot> {
        self.current.read().clone()
    }

    /// Rereads the table from disk. On error the current snapshot stays.
    /// Returns the number of records now being served.
    pub fn reload(&self) -> Result<usize, StoreError> {
        let table = self.store.load_table()?.unwrap_or_default();
        let count = table.len();
        self.replace(table);
        info!("Price table loaded: {} records", count);
        Ok(count)
    }

    pub fn replace(&self, table: PriceTable) {
        let snapshot = Arc::new(TableSnapshot {
            table,
            loaded_at: Some(Utc::now()),
        });
        *self.current.write() = snapshot;
    }
}
