//! Robots.txt parser implementation
//!
//! Allow/deny decisions are delegated to the robotstxt crate's matcher. The
//! crate does not expose crawl-delay or sitemap lines, so those are read here
//! with a small grouped parser.

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// One `User-agent` group and the crawl-delay declared inside it
#[derive(Debug, Clone, PartialEq)]
struct AgentGroup {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

impl AgentGroup {
    fn is_wildcard(&self) -> bool {
        self.agents.iter().any(|a| a == "*")
    }

    fn names(&self, token: &str) -> bool {
        self.agents.iter().any(|a| a != "*" && a == token)
    }
}

/// A site's exclusion policy
///
/// Immutable once parsed and rebuilt for every crawl session.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    origin: Url,
    /// Raw robots.txt content (empty when the policy allows everything)
    content: String,
    allow_all: bool,
    groups: Vec<AgentGroup>,
    sitemaps: Vec<Url>,
}

impl RobotsPolicy {
    /// Parses robots.txt content served by `origin`
    ///
    /// # Arguments
    ///
    /// * `origin` - The site origin, used to resolve relative `Sitemap:` values
    /// * `content` - The raw robots.txt file content
    pub fn from_content(origin: &Url, content: &str) -> Self {
        let (groups, sitemaps) = parse_directives(origin, content);
        Self {
            origin: origin.clone(),
            content: content.to_string(),
            allow_all: false,
            groups,
            sitemaps,
        }
    }

    /// Creates a permissive policy for a site without a usable robots.txt
    pub fn allow_all(origin: &Url) -> Self {
        Self {
            origin: origin.clone(),
            content: String::new(),
            allow_all: true,
            groups: Vec::new(),
            sitemaps: Vec::new(),
        }
    }

    /// Returns the origin this policy was served by
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Returns true if this is the permissive fallback policy
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Checks if a URL may be fetched by the given user agent token
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str())
    }

    /// Gets the crawl delay in seconds declared for a user agent token
    ///
    /// A group naming the agent wins over the `*` group. Returns `None` when
    /// neither declares a valid delay.
    pub fn crawl_delay_secs(&self, user_agent: &str) -> Option<f64> {
        let token = user_agent.to_lowercase();

        let specific = self
            .groups
            .iter()
            .filter(|g| g.names(&token))
            .find_map(|g| g.crawl_delay);

        specific.or_else(|| {
            self.groups
                .iter()
                .filter(|g| g.is_wildcard())
                .find_map(|g| g.crawl_delay)
        })
    }

    /// Gets the crawl delay for a user agent token, zero if unspecified
    pub fn crawl_delay(&self, user_agent: &str) -> Duration {
        self.crawl_delay_secs(user_agent)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(Duration::ZERO)
    }

    /// Returns the sitemap URLs declared with `Sitemap:` lines
    pub fn sitemap_entry_points(&self) -> &[Url] {
        &self.sitemaps
    }
}

/// Splits robots.txt into agent groups and collects sitemap declarations
fn parse_directives(origin: &Url, content: &str) -> (Vec<AgentGroup>, Vec<Url>) {
    let mut groups: Vec<AgentGroup> = Vec::new();
    let mut sitemaps: Vec<Url> = Vec::new();
    // True while consecutive User-agent lines are extending the same group
    let mut collecting_agents = false;

    for line in content.lines() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }
        .trim();

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                let agent = value.to_lowercase();
                match groups.last_mut() {
                    Some(group) if collecting_agents => group.agents.push(agent),
                    _ => groups.push(AgentGroup {
                        agents: vec![agent],
                        crawl_delay: None,
                    }),
                }
                collecting_agents = true;
            }
            "crawl-delay" => {
                collecting_agents = false;
                if let Some(group) = groups.last_mut() {
                    if let Ok(delay) = value.parse::<f64>() {
                        if delay.is_finite() && delay >= 0.0 && group.crawl_delay.is_none() {
                            group.crawl_delay = Some(delay);
                        }
                    }
                }
            }
            "sitemap" => {
                // Sitemap lines are global and do not close a group
                if let Ok(url) = origin.join(value) {
                    if !sitemaps.contains(&url) {
                        sitemaps.push(url);
                    }
                }
            }
            _ => collecting_agents = false,
        }
    }

    (groups, sitemaps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn url(path: &str) -> Url {
        origin().join(path).unwrap()
    }

    fn policy(content: &str) -> RobotsPolicy {
        RobotsPolicy::from_content(&origin(), content)
    }

    #[test]
    fn test_allow_all() {
        let robots = RobotsPolicy::allow_all(&origin());
        assert!(robots.is_allowed(&url("/any/path"), "TestBot"));
        assert_eq!(robots.crawl_delay("TestBot"), Duration::ZERO);
        assert!(robots.sitemap_entry_points().is_empty());
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = policy("User-agent: *\nDisallow: /wp-admin");
        assert!(robots.is_allowed(&url("/"), "TestBot"));
        assert!(robots.is_allowed(&url("/recipes/soup"), "TestBot"));
        assert!(!robots.is_allowed(&url("/wp-admin"), "TestBot"));
        assert!(!robots.is_allowed(&url("/wp-admin/users"), "TestBot"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let robots = policy("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(!robots.is_allowed(&url("/private"), "TestBot"));
        assert!(robots.is_allowed(&url("/private/public"), "TestBot"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let robots = policy("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(robots.is_allowed(&url("/page"), "GoodBot"));
        assert!(!robots.is_allowed(&url("/page"), "BadBot"));
    }

    #[test]
    fn test_crawl_delay_specific_beats_wildcard() {
        let robots = policy("User-agent: *\nCrawl-delay: 10\n\nUser-agent: TestBot\nCrawl-delay: 5");
        assert_eq!(robots.crawl_delay_secs("TestBot"), Some(5.0));
        assert_eq!(robots.crawl_delay_secs("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let robots = policy("User-agent: BotA\nUser-agent: BotB\nDisallow: /x\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay_secs("BotA"), Some(3.0));
        assert_eq!(robots.crawl_delay_secs("botb"), Some(3.0));
        assert_eq!(robots.crawl_delay_secs("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_fractional_and_comment() {
        let robots = policy("User-agent: *\nCrawl-delay: 2.5 # be gentle");
        assert_eq!(robots.crawl_delay("TestBot"), Duration::from_millis(2500));
    }

    #[test]
    fn test_crawl_delay_invalid_ignored() {
        let robots = policy("User-agent: *\nCrawl-delay: soon\nCrawl-delay: -4");
        assert_eq!(robots.crawl_delay_secs("TestBot"), None);
        assert_eq!(robots.crawl_delay("TestBot"), Duration::ZERO);
    }

    #[test]
    fn test_sitemap_entry_points() {
        let robots = policy(
            "Sitemap: https://example.com/sitemap_index.xml\n\
             User-agent: *\nDisallow: /cart\n\
             Sitemap: /post-sitemap.xml\n\
             Sitemap: https://example.com/sitemap_index.xml\n",
        );
        let entries: Vec<&str> = robots
            .sitemap_entry_points()
            .iter()
            .map(|u| u.as_str())
            .collect();
        assert_eq!(
            entries,
            vec![
                "https://example.com/sitemap_index.xml",
                "https://example.com/post-sitemap.xml"
            ]
        );
    }

    #[test]
    fn test_empty_content_allows_everything() {
        let robots = policy("   \n");
        assert!(robots.is_allowed(&url("/any"), "TestBot"));
    }
}
