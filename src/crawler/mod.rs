//! Crawler module for polite fetching and traversal
//!
//! This module contains the core harvesting logic, including:
//! - The fetch capability and its HTTP implementation
//! - Per-host politeness pacing
//! - HTML parsing and link extraction
//! - Breadth-first link traversal
//! - Overall harvest coordination

mod context;
mod coordinator;
mod fetcher;
mod frontier;
mod pacer;
mod parser;

pub use context::{CrawlContext, FetchKind};
pub use coordinator::{run_harvest, Coordinator};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher, RequestHeaders};
pub use frontier::{CrawledPage, Frontier, FrontierCrawler, FrontierSettings, PageOutcome};
pub use pacer::Pacer;
pub use parser::{parse_page, ParsedPage};

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Runs a complete harvest
///
/// This is the main entry point for starting a harvest. It will:
/// 1. Open (or truncate) the record store
/// 2. Build the HTTP fetcher
/// 3. Read robots.txt and set the politeness delay
/// 4. Discover pages from the sitemap or by following links
/// 5. Extract, validate and store records
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
/// * `fresh` - Start from an empty store instead of resuming
/// * `cancel` - Stops the harvest cleanly when triggered
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Harvest finished or was cancelled
/// * `Err(HarvestError)` - A fatal error stopped the harvest
pub async fn crawl(
    config: Config,
    fresh: bool,
    cancel: CancellationToken,
) -> Result<CrawlStatistics> {
    run_harvest(config, fresh, cancel).await
}
