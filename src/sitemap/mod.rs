//! Sitemap discovery
//!
//! This module parses sitemap XML and expands a sitemap hierarchy, possibly
//! several index levels deep, into the flat set of content URLs it lists.

mod parser;
mod resolver;

pub use parser::{parse_sitemap, SitemapDocument};
pub use resolver::{SitemapResolution, SitemapResolver};
