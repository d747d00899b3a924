//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the top-level run that coordinates all aspects of
//! a harvest, including:
//! - Resolving the robots policy and the politeness delay
//! - Choosing between sitemap discovery and frontier traversal
//! - Feeding extracted records through the validation pipeline
//! - Tracking statistics and handling cancellation

use crate::config::{Config, DiscoveryMode, PolicyFallback};
use crate::crawler::context::{CrawlContext, FetchKind};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher, RequestHeaders};
use crate::crawler::frontier::{FrontierCrawler, FrontierSettings, PageOutcome};
use crate::crawler::pacer::Pacer;
use crate::extract::{capture_time, Extractor, PageRecord};
use crate::output::CrawlStatistics;
use crate::robots::{fetch_policy, RobotsPolicy};
use crate::sitemap::SitemapResolver;
use crate::state::PageState;
use crate::storage::{JsonlStore, Pipeline, RecordStore};
use crate::url::{origin_root, path_matches_any, DomainScope};
use crate::{HarvestError, Result, UrlError};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main harvest coordinator structure
pub struct Coordinator<F, S> {
    config: Config,
    ctx: CrawlContext<F>,
    extractor: Extractor,
    pipeline: Pipeline<S>,
    origin: Url,
}

impl<F: PageFetcher, S: RecordStore> Coordinator<F, S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvest configuration
    /// * `fetcher` - The fetch capability used for every request
    /// * `store` - The record store accepted records are appended to
    /// * `cancel` - Cancels the run when triggered
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The origin or the selector rules are invalid
    pub fn new(config: Config, fetcher: F, store: S, cancel: CancellationToken) -> Result<Self> {
        let origin = Url::parse(config.crawler.origin.trim())?;
        if origin.host_str().is_none() {
            return Err(UrlError::MissingDomain.into());
        }

        let ctx = CrawlContext::new(
            fetcher,
            RequestHeaders::from_config(&config.user_agent),
            Pacer::new(Duration::ZERO, config.crawler.max_connections_per_host),
            config.crawler.pacing,
            cancel,
        );
        let extractor = Extractor::from_config(&config.extraction)?;
        let pipeline = Pipeline::new(store, config.extraction.min_fields);

        Ok(Self {
            config,
            ctx,
            extractor,
            pipeline,
            origin,
        })
    }

    /// Returns the validation pipeline and its store
    pub fn pipeline(&self) -> &Pipeline<S> {
        &self.pipeline
    }

    /// Runs the harvest to completion or cancellation
    ///
    /// 1. Fetches robots.txt (falling back or aborting per configuration)
    /// 2. Sets the politeness delay
    /// 3. Harvests from the sitemap, the link graph, or both
    ///
    /// Only fatal errors are returned; per-page failures are counted in the
    /// statistics.
    pub async fn run(&mut self) -> Result<CrawlStatistics> {
        let mut stats = CrawlStatistics::new();
        tracing::info!(
            "Starting harvest of {} as {}",
            self.origin,
            self.ctx.headers().user_agent
        );

        let policy = match self.resolve_policy().await {
            Ok(policy) => policy,
            Err(HarvestError::Cancelled) => {
                stats.cancelled = true;
                return Ok(stats);
            }
            Err(e) => {
                tracing::error!("{}", e);
                return Err(e);
            }
        };

        let delay = match self.config.crawler.delay_ms {
            Some(ms) => Duration::from_millis(ms),
            None => policy.crawl_delay(self.ctx.robots_token()),
        };
        self.ctx.set_delay(delay).await;
        tracing::info!("Politeness delay: {:?}", delay);

        match self.config.crawler.mode {
            DiscoveryMode::Sitemap => {
                self.harvest_sitemap(&policy, &mut stats).await?;
            }
            DiscoveryMode::Frontier => {
                self.harvest_frontier(&policy, &mut stats).await?;
            }
            DiscoveryMode::Auto => {
                let found = self.harvest_sitemap(&policy, &mut stats).await?;
                if found == 0 && !self.ctx.is_cancelled() {
                    tracing::info!("Sitemap yielded no URLs, falling back to link traversal");
                    self.harvest_frontier(&policy, &mut stats).await?;
                }
            }
        }

        stats.cancelled = self.ctx.is_cancelled();
        if stats.cancelled {
            tracing::info!("Harvest cancelled");
        } else {
            tracing::info!("Harvest complete");
        }
        stats.log_progress();

        Ok(stats)
    }

    async fn resolve_policy(&self) -> Result<RobotsPolicy> {
        let root = origin_root(&self.origin);

        match fetch_policy(&self.ctx, &root).await {
            Ok(policy) => Ok(policy),
            Err(e @ HarvestError::PolicyUnavailable { .. }) => {
                match self.config.crawler.on_policy_unavailable {
                    PolicyFallback::Unrestricted => {
                        tracing::warn!("{}; crawling unrestricted", e);
                        Ok(RobotsPolicy::allow_all(&root))
                    }
                    PolicyFallback::Abort => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn scope(&self) -> Result<DomainScope> {
        DomainScope::new(&self.origin, self.config.crawler.include_subdomains)
            .ok_or_else(|| UrlError::MissingDomain.into())
    }

    /// Configured sitemaps, else those declared in robots.txt, else
    /// `/sitemap.xml` on the origin
    fn sitemap_entry_points(&self, policy: &RobotsPolicy) -> Vec<Url> {
        let configured: Vec<Url> = self
            .config
            .crawler
            .sitemaps
            .iter()
            .filter_map(|s| Url::parse(s.trim()).ok())
            .collect();
        if !configured.is_empty() {
            return configured;
        }

        if !policy.sitemap_entry_points().is_empty() {
            return policy.sitemap_entry_points().to_vec();
        }

        origin_root(&self.origin)
            .join("/sitemap.xml")
            .map(|u| vec![u])
            .unwrap_or_default()
    }

    /// Resolves the sitemap hierarchy and harvests every URL in it
    ///
    /// Returns the number of URLs the sitemaps listed.
    async fn harvest_sitemap(
        &mut self,
        policy: &RobotsPolicy,
        stats: &mut CrawlStatistics,
    ) -> Result<usize> {
        let entry_points = self.sitemap_entry_points(policy);
        tracing::info!("Resolving {} sitemap entry points", entry_points.len());

        let resolution = SitemapResolver::new(&self.ctx, self.config.crawler.query_policy)
            .with_domain_filter(self.scope()?)
            .resolve(&entry_points)
            .await;

        stats.sitemap_nodes_fetched += resolution.nodes_fetched as u64;
        stats.sitemap_nodes_failed += resolution.nodes_failed as u64;
        stats.discovered += resolution.urls.len() as u64;
        tracing::info!(
            "Sitemaps listed {} URLs ({} nodes fetched, {} failed)",
            resolution.urls.len(),
            resolution.nodes_fetched,
            resolution.nodes_failed
        );

        let mut fetched = 0usize;
        for url in &resolution.urls {
            if self.ctx.is_cancelled() {
                break;
            }
            if self.pipeline.is_stored(url.as_str()) {
                stats.record(url.as_str(), PageState::AlreadyStored);
                continue;
            }
            if path_matches_any(url.path(), &self.config.crawler.skip_paths) {
                tracing::debug!("Skipping {} (skip path)", url);
                continue;
            }
            if !policy.is_allowed(url, self.ctx.robots_token()) {
                tracing::debug!("Skipping {} (disallowed by robots.txt)", url);
                continue;
            }
            // Sitemap mode follows no links, so listing pages are never fetched
            if path_matches_any(url.path(), &self.config.crawler.listing_paths) {
                stats.record(url.as_str(), PageState::Listing);
                continue;
            }
            if fetched >= self.config.crawler.max_pages {
                tracing::info!("Reached max pages ({})", fetched);
                break;
            }

            fetched += 1;
            match self.harvest_page(url).await {
                Ok(state) => stats.record(url.as_str(), state),
                Err(HarvestError::Cancelled) => break,
                Err(e) => {
                    tracing::error!("Aborting harvest: {}", e);
                    return Err(e);
                }
            }
        }

        Ok(resolution.urls.len())
    }

    /// Fetches one sitemap-listed page and runs it through the pipeline
    async fn harvest_page(&mut self, url: &Url) -> Result<PageState> {
        let page = match self.ctx.fetch(url, FetchKind::Page).await {
            Ok(page) => page,
            Err(HarvestError::Cancelled) => return Err(HarvestError::Cancelled),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                return Ok(PageState::FetchFailed);
            }
        };

        match self
            .extractor
            .extract_html(url, &page.body, capture_time(page.header("date")))
        {
            Ok(record) => store_record(&mut self.pipeline, record),
            Err(e) => {
                tracing::debug!("{}", e);
                Ok(PageState::NotContent)
            }
        }
    }

    /// Walks the link graph breadth-first from the configured seeds
    async fn harvest_frontier(
        &mut self,
        policy: &RobotsPolicy,
        stats: &mut CrawlStatistics,
    ) -> Result<()> {
        let settings = FrontierSettings::from_config(&self.config.crawler, &self.origin)?;

        let mut seeds: Vec<Url> = self
            .config
            .crawler
            .seeds
            .iter()
            .filter_map(|s| Url::parse(s.trim()).ok())
            .collect();
        if seeds.is_empty() {
            seeds.push(self.origin.clone());
        }
        tracing::info!("Traversing links from {} seeds", seeds.len());

        let base_discovered = stats.discovered;
        let crawler = FrontierCrawler::new(&self.ctx, policy, &self.extractor, settings, &seeds);
        let pages = crawler.into_stream();
        futures::pin_mut!(pages);

        while let Some(page) = pages.next().await {
            stats.discovered = base_discovered + page.discovered as u64;

            let state = match page.outcome {
                PageOutcome::Extracted(record) => store_record(&mut self.pipeline, record)?,
                PageOutcome::NotContent => PageState::NotContent,
                PageOutcome::Listing => PageState::Listing,
                PageOutcome::FetchFailed(_) => PageState::FetchFailed,
            };
            stats.record(page.url.as_str(), state);
        }

        Ok(())
    }
}

/// Runs a record through the pipeline and maps the result to a page state
fn store_record<S: RecordStore>(pipeline: &mut Pipeline<S>, record: PageRecord) -> Result<PageState> {
    match pipeline.accept(record) {
        Ok(true) => Ok(PageState::Accepted),
        Ok(false) => Ok(PageState::AlreadyStored),
        Err(e @ HarvestError::InsufficientFields { .. }) => {
            tracing::info!("{}", e);
            Ok(PageState::Rejected)
        }
        Err(e) => Err(e),
    }
}

/// Runs a complete harvest over HTTP into the configured NDJSON store
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
/// * `fresh` - Truncate the store instead of resuming it
/// * `cancel` - Cancels the run when triggered
pub async fn run_harvest(
    config: Config,
    fresh: bool,
    cancel: CancellationToken,
) -> Result<CrawlStatistics> {
    let fetcher = HttpFetcher::new(Duration::from_secs(config.crawler.request_timeout_secs))?;

    let path = Path::new(&config.output.records_path);
    let store = if fresh {
        JsonlStore::create(path)?
    } else {
        JsonlStore::open(path, config.crawler.query_policy)?
    };

    let mut coordinator = Coordinator::new(config, fetcher, store, cancel)?;
    coordinator.run().await
}
