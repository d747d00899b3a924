//! Robots.txt handling module
//!
//! This module fetches and parses a site's exclusion policy. The policy is
//! rebuilt for every crawl session and never cached across runs.

mod parser;

pub use parser::RobotsPolicy;

use crate::crawler::{CrawlContext, FetchKind, PageFetcher};
use crate::{HarvestError, Result};
use url::Url;

/// Fetches and parses robots.txt for an origin
///
/// # Arguments
///
/// * `ctx` - The session's fetch context
/// * `origin` - The site origin; `/robots.txt` is resolved against it
///
/// # Returns
///
/// * `Ok(RobotsPolicy)` - Successfully fetched and parsed robots.txt
/// * `Err(HarvestError::PolicyUnavailable)` - The document is empty or the
///   server answered with an error status
/// * `Err(HarvestError::OriginUnreachable)` - No response could be obtained
///   from the origin at all
pub async fn fetch_policy<F: PageFetcher>(ctx: &CrawlContext<F>, origin: &Url) -> Result<RobotsPolicy> {
    let robots_url = origin.join("/robots.txt")?;

    match ctx.fetch(&robots_url, FetchKind::Policy).await {
        Ok(page) if page.body.trim().is_empty() => Err(HarvestError::PolicyUnavailable {
            origin: origin.to_string(),
            reason: "robots.txt is empty".to_string(),
        }),
        Ok(page) => {
            tracing::debug!("Fetched robots.txt ({} bytes) for {}", page.body.len(), origin);
            Ok(RobotsPolicy::from_content(origin, &page.body))
        }
        Err(HarvestError::Network {
            status: Some(status),
            ..
        }) => Err(HarvestError::PolicyUnavailable {
            origin: origin.to_string(),
            reason: format!("robots.txt answered HTTP {}", status),
        }),
        Err(e) if e.is_transport_failure() => Err(HarvestError::OriginUnreachable {
            origin: origin.to_string(),
            message: e.to_string(),
        }),
        Err(e) => Err(e),
    }
}
