//! Per-session fetch context
//!
//! Everything a component needs to issue a polite request travels in a
//! [`CrawlContext`]: the fetch capability, the session's request headers, the
//! pacer and the cancellation token. Nothing is process-global.

use crate::config::PacingMode;
use crate::crawler::fetcher::{FetchedPage, PageFetcher, RequestHeaders};
use crate::crawler::pacer::Pacer;
use crate::{HarvestError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a request is for, which decides whether it is paced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// The robots.txt request
    Policy,
    /// A sitemap index or URL-set request
    Sitemap,
    /// A content or listing page request
    Page,
}

/// Shared state for all requests of one crawl session
pub struct CrawlContext<F> {
    fetcher: F,
    headers: RequestHeaders,
    pacer: Pacer,
    pacing: PacingMode,
    cancel: CancellationToken,
}

impl<F: PageFetcher> CrawlContext<F> {
    pub fn new(
        fetcher: F,
        headers: RequestHeaders,
        pacer: Pacer,
        pacing: PacingMode,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            headers,
            pacer,
            pacing,
            cancel,
        }
    }

    /// Returns the session's request headers
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// Returns the token used for robots.txt group matching
    pub fn robots_token(&self) -> &str {
        &self.headers.robots_token
    }

    /// Returns the underlying fetch capability
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns true once the session has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Replaces the politeness delay for the rest of the session
    pub async fn set_delay(&self, delay: Duration) {
        self.pacer.set_delay(delay).await;
    }

    /// Returns the current politeness delay
    pub async fn delay(&self) -> Duration {
        self.pacer.delay().await
    }

    fn is_paced(&self, kind: FetchKind) -> bool {
        match self.pacing {
            PacingMode::AllFetches => true,
            PacingMode::SitemapOnly => kind != FetchKind::Page,
        }
    }

    /// Fetches a URL once the pacer allows it
    ///
    /// Both the politeness wait and the request itself are abandoned when the
    /// session is cancelled.
    pub async fn fetch(&self, url: &Url, kind: FetchKind) -> Result<FetchedPage> {
        let _permit = self
            .pacer
            .acquire(url, self.is_paced(kind), &self.cancel)
            .await?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(HarvestError::Cancelled),
            result = self.fetcher.fetch(url, &self.headers) => result,
        }
    }
}
