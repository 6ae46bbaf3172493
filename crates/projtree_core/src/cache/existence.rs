//! Existence cache contract and its Bloom-filter backends.
//!
//! # Invariants
//! - `add` is idempotent.
//! - `might_contain` never returns `false` for an id whose `add` completed.
//! - `SqliteExistenceCache` merges the persisted filter before every write so
//!   concurrent writers on the same database cannot drop each other's bits.
//! - `SqliteExistenceCache` re-reads the persisted filter before answering
//!   `false`.

use super::bloom::BloomFilter;
use super::{CacheError, CacheResult};
use crate::config::RepositoryConfig;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::sync::Mutex;

/// Set-like membership index keyed by project id.
pub trait ExistenceCache {
    /// Records `project_id` as created.
    fn add(&self, project_id: &str) -> CacheResult<()>;
    /// `false` means definitely never added; `true` means maybe.
    fn might_contain(&self, project_id: &str) -> CacheResult<bool>;
}

/// Process-local cache. Membership is lost when the process exits.
#[derive(Debug)]
pub struct MemoryExistenceCache {
    filter: Mutex<BloomFilter>,
}

impl MemoryExistenceCache {
    pub fn new(expected_items: usize, false_positive_rate: f64) -> CacheResult<Self> {
        Ok(Self::from_filter(BloomFilter::with_rate(
            expected_items,
            false_positive_rate,
        )?))
    }

    /// Sizes the filter from the config's Bloom settings.
    pub fn from_config(config: &RepositoryConfig) -> CacheResult<Self> {
        Self::new(config.bloom_expected_items, config.bloom_false_positive_rate)
    }

    pub fn from_filter(filter: BloomFilter) -> Self {
        Self {
            filter: Mutex::new(filter),
        }
    }
}

impl ExistenceCache for MemoryExistenceCache {
    fn add(&self, project_id: &str) -> CacheResult<()> {
        let mut filter = self.filter.lock().map_err(|_| CacheError::Poisoned)?;
        filter.insert(project_id);
        Ok(())
    }

    fn might_contain(&self, project_id: &str) -> CacheResult<bool> {
        let filter = self.filter.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(filter.contains(project_id))
    }
}

/// Cache persisted as one row of `existence_filters`.
///
/// Positive answers are served from the in-memory copy. A negative answer
/// re-reads the persisted row first, so ids added by other connections on
/// the same database are never reported absent.
pub struct SqliteExistenceCache<'conn> {
    conn: &'conn Connection,
    name: String,
    filter: RefCell<BloomFilter>,
}

impl<'conn> SqliteExistenceCache<'conn> {
    /// Loads the filter named `name`, or sizes a fresh one when absent.
    ///
    /// A persisted filter keeps its own geometry even when the sizing
    /// arguments differ, because its bits are the membership record.
    pub fn try_new(
        conn: &'conn Connection,
        name: impl Into<String>,
        expected_items: usize,
        false_positive_rate: f64,
    ) -> CacheResult<Self> {
        let name = name.into();
        let sized = BloomFilter::with_rate(expected_items, false_positive_rate)?;
        let filter = match load_filter(conn, &name)? {
            Some(persisted) => {
                if !persisted.is_compatible(&sized) {
                    info!(
                        "event=cache_load module=cache status=ok filter={} note=persisted_geometry_kept bits={} hashes={}",
                        name,
                        persisted.num_bits(),
                        persisted.num_hashes()
                    );
                }
                persisted
            }
            None => sized,
        };

        Ok(Self {
            conn,
            name,
            filter: RefCell::new(filter),
        })
    }

    /// Opens the filter named by `config.bloom_filter_name`, sized from the
    /// config's Bloom settings.
    pub fn from_config(conn: &'conn Connection, config: &RepositoryConfig) -> CacheResult<Self> {
        Self::try_new(
            conn,
            config.bloom_filter_name.as_str(),
            config.bloom_expected_items,
            config.bloom_false_positive_rate,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ExistenceCache for SqliteExistenceCache<'_> {
    fn add(&self, project_id: &str) -> CacheResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mut next = self.filter.borrow().clone();
        if let Some(persisted) = load_filter(&tx, &self.name)? {
            merge_persisted(&mut next, persisted, &self.name);
        }
        next.insert(project_id);

        tx.execute(
            "INSERT INTO existence_filters (name, bits, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(name) DO UPDATE SET
                bits = excluded.bits,
                updated_at = excluded.updated_at;",
            params![self.name, next.to_bytes()],
        )?;
        tx.commit()?;

        *self.filter.borrow_mut() = next;
        Ok(())
    }

    fn might_contain(&self, project_id: &str) -> CacheResult<bool> {
        if self.filter.borrow().contains(project_id) {
            return Ok(true);
        }
        let Some(persisted) = load_filter(self.conn, &self.name)? else {
            return Ok(false);
        };
        let mut filter = self.filter.borrow_mut();
        merge_persisted(&mut filter, persisted, &self.name);
        Ok(filter.contains(project_id))
    }
}

/// Folds the persisted bits into `filter`. On a geometry mismatch the
/// persisted filter wins; every local bit was written through to it.
fn merge_persisted(filter: &mut BloomFilter, persisted: BloomFilter, name: &str) {
    if !filter.union(&persisted) {
        warn!(
            "event=cache_merge module=cache status=error filter={name} error_code=geometry_mismatch"
        );
        *filter = persisted;
    }
}

fn load_filter(conn: &Connection, name: &str) -> CacheResult<Option<BloomFilter>> {
    let bytes: Option<Vec<u8>> = conn
        .query_row(
            "SELECT bits FROM existence_filters WHERE name = ?1;",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    bytes.map(|bytes| BloomFilter::from_bytes(&bytes)).transpose()
}
