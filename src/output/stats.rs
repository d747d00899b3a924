//! Run statistics and store summaries
//!
//! This module provides functionality for tracking a harvest as it runs,
//! logging its progress, and summarizing an existing record store.

use crate::extract::Field;
use crate::state::PageState;
use crate::storage::read_records;
use crate::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::{Duration, Instant};

/// Pages between progress summaries
const PROGRESS_INTERVAL: u64 = 10;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// URLs known to the run (sitemap entries or enqueued links)
    pub discovered: u64,

    /// Count of processed pages by outcome
    pub pages_by_state: HashMap<PageState, u64>,

    /// Sitemap documents fetched and parsed
    pub sitemap_nodes_fetched: u64,

    /// Sitemap documents that failed
    pub sitemap_nodes_failed: u64,

    /// True if the run ended early through cancellation
    pub cancelled: bool,

    started: Instant,
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self {
            discovered: 0,
            pages_by_state: HashMap::new(),
            sitemap_nodes_fetched: 0,
            sitemap_nodes_failed: 0,
            cancelled: false,
            started: Instant::now(),
        }
    }
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one page and logs progress
    pub fn record(&mut self, url: &str, state: PageState) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;

        let processed = self.processed();
        tracing::info!("[{}/{}] {} {}", processed, self.discovered, state, url);

        if processed % PROGRESS_INTERVAL == 0 {
            self.log_progress();
        }
    }

    /// Number of pages with the given outcome
    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Total number of pages processed
    pub fn processed(&self) -> u64 {
        self.pages_by_state.values().sum()
    }

    /// Records accepted into the store during this run
    pub fn accepted(&self) -> u64 {
        self.count(PageState::Accepted)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Logs a one-line summary of the run so far
    pub fn log_progress(&self) {
        let elapsed = self.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            self.processed() as f64 / elapsed
        } else {
            0.0
        };

        tracing::info!(
            "Progress: {} processed, {} accepted, {} skipped, {} rejected, {} failed ({:.2} pages/s)",
            self.processed(),
            self.accepted(),
            self.count(PageState::AlreadyStored)
                + self.count(PageState::Listing)
                + self.count(PageState::NotContent),
            self.count(PageState::Rejected),
            self.count(PageState::FetchFailed),
            rate
        );
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  URLs discovered: {}", stats.discovered);
    println!("  Pages processed: {}", stats.processed());
    println!("  Duration: {:.1}s", stats.elapsed().as_secs_f64());
    if stats.sitemap_nodes_fetched + stats.sitemap_nodes_failed > 0 {
        println!(
            "  Sitemaps: {} fetched, {} failed",
            stats.sitemap_nodes_fetched, stats.sitemap_nodes_failed
        );
    }
    if stats.cancelled {
        println!("  Run was cancelled before completion");
    }
    println!();

    println!("Pages by State:");
    let total = stats.processed();
    for state in PageState::all_states() {
        let count = stats.count(state);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / total as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    let success_rate = if total > 0 {
        (stats.accepted() as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} pages stored)",
        success_rate,
        stats.accepted(),
        total
    );
}

/// Summary of an existing record store
#[derive(Debug, Clone, Default)]
pub struct StoreSummary {
    /// Well-formed records
    pub records: u64,

    /// Lines that could not be decoded
    pub malformed: u64,

    /// Records with a value for each extracted field
    pub field_coverage: BTreeMap<&'static str, u64>,

    /// Mean number of populated fields per record
    pub average_populated: f64,
}

/// Scans an NDJSON store and summarizes its contents
pub fn load_store_summary(path: &Path) -> Result<StoreSummary> {
    let (records, malformed) = read_records(path)?;

    let mut summary = StoreSummary {
        records: records.len() as u64,
        malformed: malformed as u64,
        ..StoreSummary::default()
    };

    let mut populated_total = 0usize;
    for record in &records {
        populated_total += record.populated_fields();
        for field in Field::ALL {
            let present = u64::from(record.has_field(field));
            *summary.field_coverage.entry(field.name()).or_insert(0) += present;
        }
    }

    if !records.is_empty() {
        summary.average_populated = populated_total as f64 / records.len() as f64;
    }

    Ok(summary)
}

/// Prints a store summary to stdout
pub fn print_store_summary(summary: &StoreSummary) {
    println!("=== Record Store ===\n");
    println!("  Records: {}", summary.records);
    if summary.malformed > 0 {
        println!("  Malformed lines: {}", summary.malformed);
    }
    println!("  Average populated fields: {:.1}", summary.average_populated);
    println!();

    println!("Field Coverage:");
    for (field, count) in &summary.field_coverage {
        let percentage = if summary.records > 0 {
            (*count as f64 / summary.records as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", field, count, percentage);
    }
}
