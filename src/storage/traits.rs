//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::extract::PageRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// A store is keyed by the record's normalized URL. Implementations never
/// hold two records for the same URL; callers check [`contains`] before
/// appending.
///
/// [`contains`]: RecordStore::contains
pub trait RecordStore {
    /// Returns true if a record for this normalized URL is stored
    fn contains(&self, url: &str) -> bool;

    /// Persists a record
    ///
    /// Once this returns `Ok`, the record survives an interruption of the
    /// process.
    fn append(&mut self, record: &PageRecord) -> StorageResult<()>;

    /// Number of stored records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
