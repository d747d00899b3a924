use url::Url;

/// File extensions that never lead to a content page
const ASSET_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "avif", "pdf", "zip", "gz", "tar",
    "rar", "css", "js", "json", "xml", "rss", "atom", "mp3", "mp4", "webm", "mov", "woff",
    "woff2", "ttf", "eot",
];

/// Checks if a domain matches a wildcard pattern
///
/// `"example.com"` matches only itself; `"*.example.com"` matches the bare
/// domain and any subdomain at any depth.
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "blog.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || candidate
                .strip_suffix(base)
                .is_some_and(|prefix| prefix.ends_with('.'))
    } else {
        candidate == pattern
    }
}

/// The set of hosts a crawl may visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    pattern: String,
}

impl DomainScope {
    /// Builds the scope rooted at `origin`'s host
    ///
    /// With `include_subdomains` the scope becomes `*.<host>`, where a
    /// leading `www.` is dropped so sibling subdomains of the site qualify.
    pub fn new(origin: &Url, include_subdomains: bool) -> Option<Self> {
        let host = origin.host_str()?.to_lowercase();
        let pattern = if include_subdomains {
            let base = host.strip_prefix("www.").unwrap_or(&host);
            format!("*.{}", base)
        } else {
            host
        };
        Some(Self { pattern })
    }

    /// Returns the host pattern, e.g. `example.com` or `*.example.com`
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the URL is http(s) and its host is in scope
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
        url.host_str()
            .map(|host| matches_wildcard(&self.pattern, &host.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Returns true if the path contains any of the given fragments
pub fn path_matches_any(path: &str, fragments: &[String]) -> bool {
    let path = path.to_lowercase();
    fragments
        .iter()
        .any(|fragment| path.contains(&fragment.to_lowercase()))
}

/// Returns true if the path's last segment carries a static asset extension
pub fn is_asset_path(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((_, ext)) => ASSET_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}
