//! HTML page parsing for the crawl loop
//!
//! This module parses a fetched page once and derives from it:
//! - Links to follow (from <a> tags and canonical links)
//! - The extracted record, for pages that are not listing pages
//!
//! The parsed document never leaves this module, so callers can hold the
//! result across await points.

use crate::extract::{Extractor, PageRecord};
use crate::Result;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

/// What a single page yielded
#[derive(Debug)]
pub struct ParsedPage {
    /// Extraction result; `None` when extraction was not requested
    pub record: Option<Result<PageRecord>>,

    /// All followable links found on the page (absolute URLs)
    pub links: Vec<Url>,
}

/// Parses HTML content, extracts links and optionally a record
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The final URL of the page, for resolving relative links
/// * `extractor` - Extracts a record when set; listing pages pass `None`
/// * `captured_at` - Capture timestamp stored in the record
pub fn parse_page(
    html: &str,
    base_url: &Url,
    extractor: Option<&Extractor>,
    captured_at: DateTime<Utc>,
) -> ParsedPage {
    let document = Html::parse_document(html);

    let record = extractor.map(|extractor| extractor.extract(base_url, &document, captured_at));
    let links = extract_links(&document, base_url);

    ParsedPage { record, links }
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
