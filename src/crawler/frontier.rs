//! Breadth-first traversal of a site's link graph
//!
//! This module handles:
//! - The FIFO frontier with its queued and visited sets
//! - Link filtering before enqueue (scope, skip paths, assets, robots)
//! - Fetching, parsing and extracting one page per step
//! - Exposing the traversal as a lazy, finite stream

use crate::config::CrawlerConfig;
use crate::crawler::context::{CrawlContext, FetchKind};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::parse_page;
use crate::extract::{capture_time, Extractor, PageRecord};
use crate::robots::RobotsPolicy;
use crate::url::{is_asset_path, normalize_url, path_matches_any, DomainScope, QueryPolicy};
use crate::{HarvestError, Result, UrlError};
use futures::Stream;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Pending URLs in discovery order plus everything already seen
///
/// A URL is enqueued at most once: `push` refuses anything queued or
/// visited, and `pop` is strict FIFO.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a normalized URL; returns false if it was already known
    pub fn push(&mut self, url: Url) -> bool {
        let key = url.to_string();
        if self.visited.contains(&key) || !self.queued.insert(key) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Dequeues the oldest pending URL
    pub fn pop(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.queued.remove(url.as_str());
        Some(url)
    }

    /// Marks a URL visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Returns true if the URL is pending or visited
    pub fn contains(&self, url: &Url) -> bool {
        self.queued.contains(url.as_str()) || self.visited.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Traversal limits and link rules
#[derive(Debug, Clone)]
pub struct FrontierSettings {
    /// Maximum number of page fetches
    pub max_pages: usize,
    /// Hosts that may be enqueued
    pub scope: DomainScope,
    /// Path fragments that are never enqueued
    pub skip_paths: Vec<String>,
    /// Path fragments of pages followed for links but not extracted
    pub listing_paths: Vec<String>,
    pub query_policy: QueryPolicy,
}

impl FrontierSettings {
    /// Derives the settings for a crawl of `origin`
    pub fn from_config(config: &CrawlerConfig, origin: &Url) -> Result<Self> {
        let scope =
            DomainScope::new(origin, config.include_subdomains).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            max_pages: config.max_pages,
            scope,
            skip_paths: config.skip_paths.clone(),
            listing_paths: config.listing_paths.clone(),
            query_policy: config.query_policy,
        })
    }
}

/// What processing one page produced
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// A record was extracted (not yet validated)
    Extracted(PageRecord),
    /// The page has no title
    NotContent,
    /// The page is a listing page; only its links were used
    Listing,
    /// The fetch failed
    FetchFailed(String),
}

/// One processed page and a progress snapshot
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: Url,
    pub outcome: PageOutcome,
    /// Pages visited so far, this one included
    pub visited: usize,
    /// URLs enqueued so far, seeds included
    pub discovered: usize,
}

/// Breadth-first crawler over a single site
///
/// Each call to [`next_page`](Self::next_page) dequeues and processes at
/// most one URL. Traversal ends when the frontier is empty, `max_pages`
/// fetches have been made, or the session is cancelled.
pub struct FrontierCrawler<'a, F> {
    ctx: &'a CrawlContext<F>,
    policy: &'a RobotsPolicy,
    extractor: &'a Extractor,
    settings: FrontierSettings,
    frontier: Frontier,
    processed: usize,
    discovered: usize,
}

impl<'a, F: PageFetcher> FrontierCrawler<'a, F> {
    /// Creates a crawler seeded with `seeds`
    ///
    /// Seeds go through the same scope and robots checks as discovered links.
    pub fn new(
        ctx: &'a CrawlContext<F>,
        policy: &'a RobotsPolicy,
        extractor: &'a Extractor,
        settings: FrontierSettings,
        seeds: &[Url],
    ) -> Self {
        let mut crawler = Self {
            ctx,
            policy,
            extractor,
            settings,
            frontier: Frontier::new(),
            processed: 0,
            discovered: 0,
        };

        for seed in seeds {
            match normalize_url(seed.as_str(), crawler.settings.query_policy) {
                Ok(url) if !crawler.settings.scope.contains(&url) => {
                    tracing::warn!("Seed {} is outside {}", url, crawler.settings.scope.pattern())
                }
                Ok(url) if !crawler.policy.is_allowed(&url, ctx.robots_token()) => {
                    tracing::warn!("Seed {} is disallowed by robots.txt", url)
                }
                Ok(url) => {
                    if crawler.frontier.push(url) {
                        crawler.discovered += 1;
                    }
                }
                Err(e) => tracing::warn!("Ignoring seed {}: {}", seed, e),
            }
        }

        crawler
    }

    /// Number of pages fetched (or attempted) so far
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Number of URLs still pending
    pub fn pending(&self) -> usize {
        self.frontier.len()
    }

    /// Processes the next URL in the frontier
    ///
    /// Returns `None` once the traversal is finished.
    pub async fn next_page(&mut self) -> Option<CrawledPage> {
        loop {
            if self.processed >= self.settings.max_pages || self.ctx.is_cancelled() {
                return None;
            }

            let url = self.frontier.pop()?;
            if !self.frontier.mark_visited(&url) {
                continue;
            }
            self.processed += 1;

            let page = match self.ctx.fetch(&url, FetchKind::Page).await {
                Ok(page) => page,
                Err(HarvestError::Cancelled) => return None,
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {}", url, e);
                    return Some(self.crawled(url, PageOutcome::FetchFailed(e.to_string())));
                }
            };

            // A redirect target is the same resource under another key
            if let Ok(final_url) = normalize_url(page.url.as_str(), self.settings.query_policy) {
                if final_url != url {
                    self.frontier.mark_visited(&final_url);
                }
            }

            let listing = path_matches_any(url.path(), &self.settings.listing_paths);
            let parsed = parse_page(
                &page.body,
                &page.url,
                (!listing).then_some(self.extractor),
                capture_time(page.header("date")),
            );

            let enqueued = self.enqueue_links(parsed.links);
            tracing::debug!("{} enqueued {} new links", url, enqueued);

            let outcome = match parsed.record {
                None => PageOutcome::Listing,
                Some(Ok(record)) => PageOutcome::Extracted(PageRecord {
                    url: url.to_string(),
                    ..record
                }),
                Some(Err(e)) => {
                    tracing::debug!("{}", e);
                    PageOutcome::NotContent
                }
            };

            return Some(self.crawled(url, outcome));
        }
    }

    /// Consumes the crawler into a stream of processed pages
    pub fn into_stream(self) -> impl Stream<Item = CrawledPage> + 'a
    where
        F: 'a,
    {
        futures::stream::unfold(self, |mut crawler| async move {
            let page = crawler.next_page().await?;
            Some((page, crawler))
        })
    }

    fn crawled(&self, url: Url, outcome: PageOutcome) -> CrawledPage {
        CrawledPage {
            url,
            outcome,
            visited: self.frontier.visited_count(),
            discovered: self.discovered,
        }
    }

    /// Filters and enqueues links; returns how many were new
    fn enqueue_links(&mut self, links: Vec<Url>) -> usize {
        let mut enqueued = 0;

        for link in links {
            let Ok(url) = normalize_url(link.as_str(), self.settings.query_policy) else {
                continue;
            };

            if self.frontier.contains(&url) {
                continue;
            }
            if !self.settings.scope.contains(&url) {
                continue;
            }
            if path_matches_any(url.path(), &self.settings.skip_paths) {
                tracing::debug!("Skipping {} (skip path)", url);
                continue;
            }
            if is_asset_path(url.path()) {
                tracing::debug!("Skipping {} (asset)", url);
                continue;
            }
            if !self.policy.is_allowed(&url, self.ctx.robots_token()) {
                tracing::debug!("Skipping {} (disallowed by robots.txt)", url);
                continue;
            }

            if self.frontier.push(url) {
                enqueued += 1;
                self.discovered += 1;
            }
        }

        enqueued
    }
}
