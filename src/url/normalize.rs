use crate::UrlError;
use serde::Deserialize;
use url::Url;

/// Query parameters that never identify a distinct resource
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
    "ref",
    "replytocom",
    "share",
];

/// How the query string takes part in a URL's identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryPolicy {
    /// Identity is scheme + host + path; the query is discarded
    #[default]
    Drop,
    /// Tracking parameters are removed and the rest sorted by key
    Keep,
}

/// Normalizes a URL into the key used by visited sets, the frontier and the store
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Lowercase the host (the port is kept)
/// 3. Normalize the path:
///    - Remove dot segments and repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 4. Remove the fragment
/// 5. Apply the query policy
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
/// * `policy` - Query string handling
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::{normalize_url, QueryPolicy};
///
/// let url = normalize_url("https://Example.COM/Recipes/Soup/?page=2#top", QueryPolicy::Drop).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Recipes/Soup");
/// ```
pub fn normalize_url(url_str: &str, policy: QueryPolicy) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    match policy {
        QueryPolicy::Drop => url.set_query(None),
        QueryPolicy::Keep => {
            let params = filter_and_sort_query_params(&url);
            if params.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(params);
            }
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Drops tracking parameters and sorts the remainder by key
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
