//! Write-through contact store
//!
//! The in-memory cache answers every query; the durable table is written on
//! every mutation while the cache's write lock is held, so all writers are
//! serialized and readers only ever wait behind an in-progress write.

use crate::config::{StorageBackend, StorageConfig};
use crate::storage::flat_file::{write_flat_file, FlatFileTable};
use crate::storage::sqlite::SqliteTable;
use crate::storage::traits::{ContactTable, StorageResult};
use crate::storage::{ContactRecord, SortField, StoreStats};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// URL-keyed cache over a durable [`ContactTable`]
pub struct ContactStore {
    cache: RwLock<HashMap<String, ContactRecord>>,
    table: Mutex<Box<dyn ContactTable>>,
}

impl ContactStore {
    /// Wraps `table` and warms the cache with every row it holds
    ///
    /// A failed load is logged and leaves the cache empty.
    pub fn new(table: Box<dyn ContactTable>) -> Self {
        let store = Self {
            cache: RwLock::new(HashMap::new()),
            table: Mutex::new(table),
        };
        store.warm_up();
        store
    }

    /// Opens the backend selected by `config`
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let path = Path::new(&config.path);
        let table: Box<dyn ContactTable> = match config.backend {
            StorageBackend::Sqlite => Box::new(SqliteTable::open(path)?),
            StorageBackend::FlatFile => Box::new(FlatFileTable::open(path)?),
        };

        tracing::info!("Opened {:?} contact store at {}", config.backend, config.path);
        Ok(Self::new(table))
    }

    /// A store backed by an in-memory SQLite database
    pub fn in_memory() -> StorageResult<Self> {
        Ok(Self::new(Box::new(SqliteTable::open_in_memory()?)))
    }

    fn warm_up(&self) {
        let mut cache = self.write_cache();
        match self.lock_table().load_all() {
            Ok(records) => {
                for record in records {
                    cache.insert(record.url.clone(), record);
                }
                tracing::info!("Loaded {} contact records into cache", cache.len());
            }
            Err(e) => tracing::error!("Failed to load contact records: {}", e),
        }
    }

    /// Replaces the record for `record.url` in the cache, then in the table
    ///
    /// If the durable write fails the cache keeps the new record; the error
    /// is returned for the caller to log.
    pub fn save(&self, record: ContactRecord) -> StorageResult<()> {
        let mut cache = self.write_cache();
        cache.remove(&record.url);
        cache.insert(record.url.clone(), record.clone());

        self.lock_table().upsert(&record)
    }

    /// Point-in-time copy of every record, ordered by url
    pub fn all(&self) -> Vec<ContactRecord> {
        let mut records: Vec<ContactRecord> = self.read_cache().values().cloned().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }

    /// Snapshot sorted on `field`; ties are broken by ascending url
    pub fn sorted_by(&self, field: SortField, ascending: bool) -> Vec<ContactRecord> {
        let mut records = self.all();
        records.sort_by(|a, b| {
            let ordering = field.compare(a, b);
            let ordering = if ascending {
                ordering
            } else {
                ordering.reverse()
            };
            ordering.then_with(|| a.url.cmp(&b.url))
        });
        records
    }

    /// Records where `term` appears, case-insensitively, in any field
    ///
    /// A blank term matches everything.
    pub fn filter(&self, term: &str) -> Vec<ContactRecord> {
        let needle = term.trim().to_lowercase();
        let records = self.all();
        if needle.is_empty() {
            return records;
        }

        records
            .into_par_iter()
            .filter(|record| record.matches(&needle))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.read_cache().len()
    }

    /// Drops every record from the cache and the table
    pub fn clear(&self) -> StorageResult<()> {
        let mut cache = self.write_cache();
        cache.clear();
        self.lock_table().delete_all()
    }

    /// Counts of records overall and with each kind of signal
    pub fn stats(&self) -> StoreStats {
        let cache = self.read_cache();
        cache.values().fold(
            StoreStats {
                total: cache.len(),
                ..StoreStats::default()
            },
            |mut stats, record| {
                stats.with_phones += usize::from(!record.phones.is_empty());
                stats.with_emails += usize::from(!record.emails.is_empty());
                stats.with_addresses += usize::from(!record.addresses.is_empty());
                stats
            },
        )
    }

    /// Writes the current snapshot to `path` in the flat-file format
    pub fn export_flat_file(&self, path: &Path) -> StorageResult<usize> {
        let records = self.all();
        write_flat_file(path, &records)?;
        tracing::info!("Exported {} contact records to {}", records.len(), path.display());
        Ok(records.len())
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<String, ContactRecord>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<String, ContactRecord>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_table(&self) -> MutexGuard<'_, Box<dyn ContactTable>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
