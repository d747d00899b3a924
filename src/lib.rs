//! Sumi-Harvest: a polite, resumable content harvester
//!
//! This crate discovers the content URLs of a single site, either from its
//! sitemap hierarchy or by walking its link graph breadth-first, and extracts a
//! structured record from every page it visits. It honors robots.txt rules and
//! crawl-delay directives, and appends accepted records to a newline-delimited
//! JSON store that can be resumed after an interrupted run.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod storage;
pub mod url;

#[cfg(test)]
mod testutil;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Robots policy unavailable for {origin}: {reason}")]
    PolicyUnavailable { origin: String, reason: String },

    #[error("Origin {origin} is unreachable: {message}")]
    OriginUnreachable { origin: String, message: String },

    #[error("Network error for {url}: {message}")]
    Network {
        url: String,
        /// HTTP status when the server answered with a non-2xx code,
        /// `None` for transport failures
        status: Option<u16>,
        message: String,
    },

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Record for {url} has {populated} populated fields, {required} required")]
    InsufficientFields {
        url: String,
        populated: usize,
        required: usize,
    },

    #[error("Not a content page: {url}")]
    NotContentPage { url: String },

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if this error must abort the whole run
    ///
    /// Per-URL failures (network, parse, rejected records) are logged and
    /// skipped. Only an unreachable origin, a broken store, or a bad
    /// configuration stop the harvest.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OriginUnreachable { .. }
                | Self::Config(_)
                | Self::Storage(_)
                | Self::Io(_)
                | Self::Reqwest(_)
        )
    }

    /// Returns true for network errors where no HTTP response was received
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Network { status: None, .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FrontierCrawler, HttpFetcher, PageFetcher};
pub use extract::{Extractor, PageRecord};
pub use robots::RobotsPolicy;
pub use sitemap::SitemapResolver;
pub use state::PageState;
pub use storage::{JsonlStore, Pipeline, RecordStore};
pub use url::{extract_domain, normalize_url, DomainScope, QueryPolicy};
