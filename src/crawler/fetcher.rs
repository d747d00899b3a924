//! HTTP fetcher implementation
//!
//! This module defines the page-fetch capability the rest of the crawler is
//! written against, and its reqwest-backed implementation:
//! - Request headers built once from configuration and passed explicitly
//! - Response capture (final URL, status, body, lower-cased headers)
//! - Error classification into HTTP status vs transport failures

use crate::config::UserAgentConfig;
use crate::{HarvestError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Headers sent with every request of a crawl session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    /// Full User-Agent header value
    pub user_agent: String,
    /// Product token used for robots.txt group matching
    pub robots_token: String,
    /// Additional headers, sent verbatim
    pub extra: BTreeMap<String, String>,
}

impl RequestHeaders {
    /// Builds the session headers from the user agent configuration
    pub fn from_config(config: &UserAgentConfig) -> Self {
        let mut extra = BTreeMap::new();
        extra.insert(
            "accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        );
        Self {
            user_agent: config.header_value(),
            robots_token: config.crawler_name.clone(),
            extra,
        }
    }

    fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            map.insert(USER_AGENT, value);
        }
        for (name, value) in &self.extra {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid request header '{}'", name),
            }
        }
        map
    }
}

/// A successfully fetched (2xx) response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Decoded response body
    pub body: String,
    /// Response headers keyed by lower-cased name
    pub headers: BTreeMap<String, String>,
}

impl FetchedPage {
    /// Returns a response header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// The page-fetch capability
///
/// Implementations fail with [`HarvestError::Network`] on transport failures
/// (`status: None`) and on non-2xx responses (`status: Some(code)`). They do
/// not retry.
pub trait PageFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &Url,
        headers: &RequestHeaders,
    ) -> impl Future<Output = Result<FetchedPage>> + Send;
}

/// [`PageFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds an HTTP client with the crawl's timeouts
    ///
    /// # Arguments
    ///
    /// * `timeout` - Whole-request timeout; the connect timeout is capped at 10s
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Successfully built fetcher
    /// * `Err(HarvestError::Reqwest)` - The TLS backend could not be initialized
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, headers: &RequestHeaders) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.to_header_map())
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Network {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }

        let final_url = response.url().clone();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(url, e))?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
            headers: response_headers,
        })
    }
}

/// Classifies a reqwest failure that produced no usable response
fn transport_error(url: &Url, error: reqwest::Error) -> HarvestError {
    let message = if error.is_timeout() {
        format!("timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_redirect() {
        format!("redirect error: {}", error)
    } else {
        error.to_string()
    };

    HarvestError::Network {
        url: url.to_string(),
        status: None,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ua_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_headers_from_config() {
        let headers = RequestHeaders::from_config(&ua_config());
        assert_eq!(
            headers.user_agent,
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
        assert_eq!(headers.robots_token, "TestCrawler");
        assert!(headers.extra.contains_key("accept"));
    }

    #[test]
    fn test_header_map_contains_user_agent() {
        let headers = RequestHeaders::from_config(&ua_config());
        let map = headers.to_header_map();
        assert_eq!(
            map.get(USER_AGENT).and_then(|v| v.to_str().ok()),
            Some(headers.user_agent.as_str())
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("date".to_string(), "Tue, 15 Nov 1994 08:12:31 GMT".to_string());
        let page = FetchedPage {
            url: Url::parse("https://example.com/").unwrap(),
            status: 200,
            body: String::new(),
            headers,
        };
        assert_eq!(page.header("Date"), Some("Tue, 15 Nov 1994 08:12:31 GMT"));
        assert_eq!(page.header("etag"), None);
    }

    #[test]
    fn test_build_fetcher() {
        assert!(HttpFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
