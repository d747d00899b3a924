//! Validation and sink pipeline

use crate::extract::PageRecord;
use crate::storage::traits::RecordStore;
use crate::{HarvestError, Result};

/// Gatekeeper between extraction and the record store
///
/// A record is appended only if its URL is not stored yet and it populates
/// at least `min_fields` fields.
pub struct Pipeline<S> {
    store: S,
    min_fields: usize,
}

impl<S: RecordStore> Pipeline<S> {
    pub fn new(store: S, min_fields: usize) -> Self {
        Self { store, min_fields }
    }

    /// Validates and persists a record
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The record was appended
    /// * `Ok(false)` - A record for this URL is already stored
    /// * `Err(HarvestError::InsufficientFields)` - Too few populated fields
    /// * `Err(HarvestError::Storage)` - The append failed
    pub fn accept(&mut self, record: PageRecord) -> Result<bool> {
        if self.store.contains(&record.url) {
            tracing::debug!("{} already stored", record.url);
            return Ok(false);
        }

        let populated = record.populated_fields();
        if populated < self.min_fields {
            return Err(HarvestError::InsufficientFields {
                url: record.url,
                populated,
                required: self.min_fields,
            });
        }

        self.store.append(&record)?;
        Ok(true)
    }

    /// Returns true if a record for this normalized URL is stored
    pub fn is_stored(&self, url: &str) -> bool {
        self.store.contains(url)
    }

    pub fn min_fields(&self) -> usize {
        self.min_fields
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
