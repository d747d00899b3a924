//! Test utilities: a scripted fetch capability.
//!
//! Responses are keyed by URL and may be served any number of times. Every
//! call is recorded so tests can assert on request order and headers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use url::Url;

use crate::crawler::{FetchedPage, PageFetcher, RequestHeaders};
use crate::{HarvestError, Result};

#[derive(Clone)]
enum MockResponse {
    Page {
        body: String,
        headers: BTreeMap<String, String>,
    },
    Status(u16),
    TransportError,
    LocalFailure,
}

/// Mock fetcher serving scripted responses; unscripted URLs answer 404.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, url: &str, response: MockResponse) -> Self {
        let key = Url::parse(url).unwrap().to_string();
        self.responses.lock().unwrap().insert(key, response);
        self
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.with_page_headers(url, body, &[])
    }

    pub fn with_page_headers(self, url: &str, body: &str, headers: &[(&str, &str)]) -> Self {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect();
        self.script(
            url,
            MockResponse::Page {
                body: body.to_string(),
                headers,
            },
        )
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.script(url, MockResponse::Status(status))
    }

    pub fn with_transport_error(self, url: &str) -> Self {
        self.script(url, MockResponse::TransportError)
    }

    /// Fails with an error that is not about the remote site at all.
    pub fn with_local_failure(self, url: &str) -> Self {
        self.script(url, MockResponse::LocalFailure)
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// User-Agent values sent so far, in order.
    pub fn user_agents(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, ua)| ua.clone())
            .collect()
    }

    pub fn request_count(&self, url: &str) -> usize {
        let key = Url::parse(url).unwrap().to_string();
        self.requests().iter().filter(|u| **u == key).count()
    }
}

impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &Url, headers: &RequestHeaders) -> Result<FetchedPage> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.user_agent.clone()));

        let response = self.responses.lock().unwrap().get(url.as_str()).cloned();
        match response {
            Some(MockResponse::Page { body, headers }) => Ok(FetchedPage {
                url: url.clone(),
                status: 200,
                body,
                headers,
            }),
            Some(MockResponse::Status(status)) => Err(HarvestError::Network {
                url: url.to_string(),
                status: Some(status),
                message: format!("HTTP {}", status),
            }),
            Some(MockResponse::TransportError) => Err(HarvestError::Network {
                url: url.to_string(),
                status: None,
                message: "connection refused".to_string(),
            }),
            Some(MockResponse::LocalFailure) => Err(HarvestError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "too many open files",
            ))),
            None => Err(HarvestError::Network {
                url: url.to_string(),
                status: Some(404),
                message: "HTTP 404".to_string(),
            }),
        }
    }
}
