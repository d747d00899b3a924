//! In-memory record store

use crate::extract::PageRecord;
use crate::storage::traits::{RecordStore, StorageResult};
use std::collections::HashSet;

/// Record store that keeps everything in memory
///
/// Used for dry runs and tests; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<PageRecord>,
    urls: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored records in append order
    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }
}

impl RecordStore for MemoryStore {
    fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    fn append(&mut self, record: &PageRecord) -> StorageResult<()> {
        self.urls.insert(record.url.clone());
        self.records.push(record.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
