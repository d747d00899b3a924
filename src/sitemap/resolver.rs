//! Sitemap hierarchy resolution

use crate::crawler::{CrawlContext, FetchKind, PageFetcher};
use crate::sitemap::parser::{parse_sitemap, SitemapDocument};
use crate::url::{normalize_url, DomainScope, QueryPolicy};
use crate::HarvestError;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// The flattened result of resolving a sitemap hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapResolution {
    /// Normalized content URLs, duplicate-free, in discovery order
    pub urls: Vec<Url>,
    /// Sitemap documents fetched and parsed successfully
    pub nodes_fetched: usize,
    /// Sitemap documents that failed to fetch or parse
    pub nodes_failed: usize,
}

/// Expands sitemap entry points into the set of content URLs they reference
///
/// Pacing between node fetches is the context's job: every fetch goes
/// through its pacer as a sitemap request.
pub struct SitemapResolver<'a, F> {
    ctx: &'a CrawlContext<F>,
    filter: Option<DomainScope>,
    query_policy: QueryPolicy,
}

impl<'a, F: PageFetcher> SitemapResolver<'a, F> {
    pub fn new(ctx: &'a CrawlContext<F>, query_policy: QueryPolicy) -> Self {
        Self {
            ctx,
            filter: None,
            query_policy,
        }
    }

    /// Keeps only content URLs whose host is in `scope`
    pub fn with_domain_filter(mut self, scope: DomainScope) -> Self {
        self.filter = Some(scope);
        self
    }

    /// Resolves the entry points
    ///
    /// Nodes are processed from an explicit worklist. A node's normalized URL
    /// enters the seen set before it is queued, so no node is fetched twice
    /// even in cyclic hierarchies. A node that fails to fetch or parse
    /// contributes nothing and does not affect its siblings. Cancellation
    /// stops the walk and returns what was resolved so far.
    pub async fn resolve(&self, entry_points: &[Url]) -> SitemapResolution {
        let mut resolution = SitemapResolution::default();
        let mut seen_nodes: HashSet<String> = HashSet::new();
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut worklist: VecDeque<Url> = VecDeque::new();

        for entry in entry_points {
            self.enqueue_node(entry.as_str(), &mut seen_nodes, &mut worklist);
        }

        while let Some(node) = worklist.pop_front() {
            if self.ctx.is_cancelled() {
                tracing::info!("Sitemap resolution cancelled with {} nodes pending", worklist.len() + 1);
                break;
            }

            let page = match self.ctx.fetch(&node, FetchKind::Sitemap).await {
                Ok(page) => page,
                Err(HarvestError::Cancelled) => break,
                Err(e) => {
                    tracing::warn!("Skipping sitemap {}: {}", node, e);
                    resolution.nodes_failed += 1;
                    continue;
                }
            };

            let document = match parse_sitemap(node.as_str(), &page.body) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Skipping sitemap {}: {}", node, e);
                    resolution.nodes_failed += 1;
                    continue;
                }
            };
            resolution.nodes_fetched += 1;

            match document {
                SitemapDocument::Index(children) => {
                    tracing::debug!("Sitemap index {} lists {} sitemaps", node, children.len());
                    for child in children {
                        match page.url.join(&child) {
                            Ok(child) => {
                                self.enqueue_node(child.as_str(), &mut seen_nodes, &mut worklist)
                            }
                            Err(e) => tracing::debug!("Ignoring sitemap location '{}': {}", child, e),
                        }
                    }
                }
                SitemapDocument::UrlSet(locations) => {
                    let before = resolution.urls.len();
                    for loc in locations {
                        if let Some(url) = self.accept_location(&page.url, &loc) {
                            if seen_urls.insert(url.to_string()) {
                                resolution.urls.push(url);
                            }
                        }
                    }
                    tracing::info!(
                        "Sitemap {} added {} URLs ({} total)",
                        node,
                        resolution.urls.len() - before,
                        resolution.urls.len()
                    );
                }
            }
        }

        resolution
    }

    /// Queues a sitemap node unless its normalized URL was already seen
    fn enqueue_node(&self, raw: &str, seen: &mut HashSet<String>, worklist: &mut VecDeque<Url>) {
        // Sitemap nodes keep their query string: paginated sitemaps differ only by it
        match normalize_url(raw, QueryPolicy::Keep) {
            Ok(url) => {
                if seen.insert(url.to_string()) {
                    worklist.push_back(url);
                } else {
                    tracing::debug!("Sitemap {} already seen", url);
                }
            }
            Err(e) => tracing::debug!("Ignoring sitemap location '{}': {}", raw, e),
        }
    }

    /// Normalizes a `<loc>` value and applies the domain filter
    fn accept_location(&self, base: &Url, loc: &str) -> Option<Url> {
        let joined = base.join(loc).ok()?;
        let url = match normalize_url(joined.as_str(), self.query_policy) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Ignoring location '{}': {}", loc, e);
                return None;
            }
        };

        match &self.filter {
            Some(scope) if !scope.contains(&url) => {
                tracing::debug!("Location {} is outside {}", url, scope.pattern());
                None
            }
            _ => Some(url),
        }
    }
}
