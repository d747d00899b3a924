use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How content URLs are discovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryMode {
    /// Resolve the sitemap hierarchy declared by the site
    Sitemap,
    /// Walk the link graph breadth-first from the seeds
    Frontier,
    /// Sitemap first, falling back to the frontier when it yields nothing
    #[default]
    Auto,
}

/// Which fetches the crawl delay applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacingMode {
    /// Every request waits out the delay
    #[default]
    AllFetches,
    /// Only the policy and sitemap-node requests wait out the delay
    SitemapOnly,
}

/// What to do when robots.txt is missing or empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyFallback {
    /// Crawl as if robots.txt allowed everything
    #[default]
    Unrestricted,
    /// Abort the run
    Abort,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Site origin, e.g. "https://example.com"
    pub origin: String,

    /// URL discovery mode
    pub mode: DiscoveryMode,

    /// Maximum number of page fetches per run
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Fixed delay between requests to the same host (milliseconds).
    /// When unset the robots.txt crawl-delay is used.
    #[serde(rename = "delay-ms")]
    pub delay_ms: Option<u64>,

    /// Which fetches the delay applies to
    pub pacing: PacingMode,

    /// Maximum number of in-flight requests to a single host
    #[serde(rename = "max-connections-per-host")]
    pub max_connections_per_host: usize,

    /// Whether subdomains of the origin host are in scope
    #[serde(rename = "include-subdomains")]
    pub include_subdomains: bool,

    /// Behavior when robots.txt cannot be used
    #[serde(rename = "on-policy-unavailable")]
    pub on_policy_unavailable: PolicyFallback,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Query string handling during URL normalization
    #[serde(rename = "query-policy")]
    pub query_policy: crate::url::QueryPolicy,

    /// Start URLs for frontier mode (defaults to the origin)
    pub seeds: Vec<String>,

    /// Sitemap entry points; when set, they replace those declared in robots.txt
    pub sitemaps: Vec<String>,

    /// Path fragments that are never enqueued
    #[serde(rename = "skip-paths")]
    pub skip_paths: Vec<String>,

    /// Path fragments of listing pages: followed for links, not extracted
    #[serde(rename = "listing-paths")]
    pub listing_paths: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            mode: DiscoveryMode::default(),
            max_pages: 100,
            delay_ms: None,
            pacing: PacingMode::default(),
            max_connections_per_host: 1,
            include_subdomains: false,
            on_policy_unavailable: PolicyFallback::default(),
            request_timeout_secs: 30,
            query_policy: crate::url::QueryPolicy::default(),
            seeds: Vec::new(),
            sitemaps: Vec::new(),
            skip_paths: default_skip_paths(),
            listing_paths: Vec::new(),
        }
    }
}

fn default_skip_paths() -> Vec<String> {
    [
        "/wp-admin",
        "/wp-login",
        "/cdn-cgi/",
        "/cart",
        "/checkout",
        "/my-account",
        "/product",
        "/cookbook",
        "/privacy",
        "/terms",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt group token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
            contact_email: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesized part reduced to whatever contact details are set.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            (!self.contact_url.is_empty()).then(|| format!("+{}", self.contact_url)),
            (!self.contact_email.is_empty()).then(|| self.contact_email.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Record extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum number of populated fields for a record to be stored
    #[serde(rename = "min-fields")]
    pub min_fields: usize,

    /// Per-field selector chains replacing the built-in ones
    pub selectors: BTreeMap<String, Vec<String>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_fields: 10,
            selectors: BTreeMap::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the newline-delimited JSON record store
    #[serde(rename = "records-path")]
    pub records_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: "./records.jsonl".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_with_contacts() {
        let ua = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        };
        assert_eq!(
            ua.header_value(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_header_value_without_contacts() {
        let ua = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: String::new(),
            contact_email: String::new(),
        };
        assert_eq!(ua.header_value(), "TestCrawler/1.0");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawler.max_pages, 100);
        assert_eq!(config.crawler.max_connections_per_host, 1);
        assert_eq!(config.crawler.mode, DiscoveryMode::Auto);
        assert_eq!(config.crawler.pacing, PacingMode::AllFetches);
        assert_eq!(config.extraction.min_fields, 10);
        assert!(config.crawler.delay_ms.is_none());
    }

    #[test]
    fn test_default_skip_paths() {
        let skip = Config::default().crawler.skip_paths;
        for path in ["/wp-admin", "/cdn-cgi/", "/cart", "/product", "/cookbook", "/privacy", "/terms"] {
            assert!(skip.iter().any(|p| p == path), "missing {}", path);
        }
    }
}
