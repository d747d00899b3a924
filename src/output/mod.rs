//! Output module for harvest statistics and summaries
//!
//! This module handles:
//! - Tracking page outcomes while a harvest runs
//! - Periodic progress logging
//! - Final run summaries and summaries of an existing store

pub mod stats;

pub use stats::{
    load_store_summary, print_statistics, print_store_summary, CrawlStatistics, StoreSummary,
};
