//! Probabilistic existence cache in front of the project store.
//!
//! # Responsibility
//! - Answer "has this project id ever been created?" without a store lookup.
//! - Keep membership across restarts when backed by SQLite.
//!
//! # Invariants
//! - No false negatives for ids whose `add` completed.
//! - False positives are possible and must be confirmed against the store.
//! - Membership is never removed: delete/recover do not touch the cache.

pub mod bloom;
pub mod existence;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    /// Sizing parameters cannot produce a usable filter.
    InvalidSizing {
        expected_items: usize,
        false_positive_rate: f64,
    },
    /// Persisted filter bytes could not be decoded.
    Corrupt(String),
    /// In-process filter lock was poisoned by a panicking writer.
    Poisoned,
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidSizing {
                expected_items,
                false_positive_rate,
            } => write!(
                f,
                "invalid bloom filter sizing: expected_items={expected_items} false_positive_rate={false_positive_rate}"
            ),
            Self::Corrupt(message) => write!(f, "corrupt bloom filter: {message}"),
            Self::Poisoned => write!(f, "existence cache lock poisoned"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
