//! Storage module for persisting harvested records
//!
//! This module handles:
//! - The record store interface, keyed by normalized URL
//! - An append-only NDJSON store that can be resumed
//! - An in-memory store for dry runs and tests
//! - The validation pipeline in front of the store

mod jsonl;
mod memory;
mod pipeline;
mod traits;

pub use jsonl::{read_records, JsonlStore};
pub use memory::MemoryStore;
pub use pipeline::Pipeline;
pub use traits::{RecordStore, StorageError, StorageResult};
