//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full harvest cycle end-to-end, from robots.txt to the record store.

use std::path::Path;
use std::time::{Duration, Instant};
use sumi_harvest::config::{Config, DiscoveryMode, UserAgentConfig};
use sumi_harvest::crawler::crawl;
use sumi_harvest::state::PageState;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Optional record fields, each populating exactly one field
const FIELD_FRAGMENTS: [&str; 12] = [
    r#"<span class="author"><a href="/about">Jo</a></span>"#,
    r#"<time class="entry-date" datetime="2024-01-02">Jan 2</time>"#,
    r#"<div class="breadcrumb"><a href="/category/dinner/">Dinner</a></div>"#,
    r#"<figure><img src="/uploads/dish.jpg"></figure>"#,
    r#"<span class="wprm-recipe-servings">4</span>"#,
    r#"<span class="wprm-recipe-prep_time">10 mins</span>"#,
    r#"<span class="wprm-recipe-cook_time">20 mins</span>"#,
    r#"<span class="wprm-recipe-total_time">30 mins</span>"#,
    r#"<ul class="ingredients"><li>1 cup rice</li><li>2 cups water</li></ul>"#,
    r#"<ol class="instructions"><li>Rinse.</li><li>Simmer.</li></ol>"#,
    r#"<div class="nutrition">300 kcal</div>"#,
    r#"<span class="rating">4.8</span>"#,
];

/// A recipe page populating `3 + extra` fields (url, title, capture time)
fn recipe_page(title: &str, extra: usize, links: &[&str]) -> String {
    let fields: String = FIELD_FRAGMENTS.iter().take(extra).copied().collect();
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();
    format!(
        r#"<html><head><title>{}</title></head><body>
        <h1 class="entry-title">{}</h1>
        {}
        {}
        </body></html>"#,
        title, title, fields, anchors
    )
}

fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{}</loc></url>", u))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

/// Creates a test configuration harvesting `origin` into `records_path`
fn create_test_config(origin: &str, records_path: &Path, mode: DiscoveryMode) -> Config {
    let mut config = Config::default();
    config.crawler.origin = origin.to_string();
    config.crawler.mode = mode;
    config.crawler.delay_ms = Some(10); // Very short for testing
    config.user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    config.extraction.min_fields = 3;
    config.output.records_path = records_path.display().to_string();
    config
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn stored_lines(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("Stored line is not JSON"))
        .collect()
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

/// Mounts a two-level sitemap hierarchy listing six recipe pages
async fn mount_sitemap_site(server: &MockServer) {
    let base = server.uri();

    mount_robots(
        server,
        &format!("User-agent: *\nAllow: /\nSitemap: {}/sitemap_index.xml", base),
    )
    .await;

    mount_page(
        server,
        "/sitemap_index.xml",
        format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap><loc>{0}/post-sitemap.xml</loc></sitemap>
            <sitemap><loc>{0}/recipe-sitemap.xml</loc></sitemap>
            </sitemapindex>"#,
            base
        ),
    )
    .await;

    let first: Vec<String> = (1..=3).map(|i| format!("{}/recipes/{}", base, i)).collect();
    let second: Vec<String> = (4..=6).map(|i| format!("{}/recipes/{}", base, i)).collect();
    mount_page(server, "/post-sitemap.xml", urlset(&first)).await;
    mount_page(server, "/recipe-sitemap.xml", urlset(&second)).await;

    for i in 1..=6 {
        mount_page(
            server,
            &format!("/recipes/{}", i),
            recipe_page(&format!("Recipe {}", i), 12, &[]),
        )
        .await;
    }
}

#[tokio::test]
async fn test_sitemap_index_harvest() {
    let mock_server = MockServer::start().await;
    mount_sitemap_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let config = create_test_config(&mock_server.uri(), &records, DiscoveryMode::Sitemap);

    let stats = crawl(config, false, CancellationToken::new())
        .await
        .expect("Harvest failed");

    assert_eq!(stats.discovered, 6);
    assert_eq!(stats.sitemap_nodes_fetched, 3);
    assert_eq!(stats.accepted(), 6);

    let lines = stored_lines(&records);
    assert_eq!(lines.len(), 6);
    assert!(lines
        .iter()
        .all(|r| r["title"].as_str().unwrap().starts_with("Recipe ")));
    assert_eq!(lines[0]["ingredients"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rerun_does_not_duplicate_records() {
    let mock_server = MockServer::start().await;
    mount_sitemap_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let config = create_test_config(&mock_server.uri(), &records, DiscoveryMode::Sitemap);

    crawl(config.clone(), false, CancellationToken::new())
        .await
        .expect("First harvest failed");
    assert_eq!(stored_lines(&records).len(), 6);

    let second = crawl(config, false, CancellationToken::new())
        .await
        .expect("Second harvest failed");

    assert_eq!(second.accepted(), 0);
    assert_eq!(second.count(PageState::AlreadyStored), 6);
    assert_eq!(stored_lines(&records).len(), 6);

    // Stored pages are skipped before fetching
    let page_fetches = requested_paths(&mock_server)
        .await
        .into_iter()
        .filter(|p| p.starts_with("/recipes/"))
        .count();
    assert_eq!(page_fetches, 6);
}

#[tokio::test]
async fn test_fresh_run_truncates_store() {
    let mock_server = MockServer::start().await;
    mount_sitemap_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let config = create_test_config(&mock_server.uri(), &records, DiscoveryMode::Sitemap);

    crawl(config.clone(), false, CancellationToken::new())
        .await
        .unwrap();
    let stats = crawl(config, true, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.accepted(), 6);
    assert_eq!(stored_lines(&records).len(), 6);
}

#[tokio::test]
async fn test_frontier_breadth_first_with_page_budget() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/",
        recipe_page("Home", 0, &["/p1", "/p2", "/p3", "/p4", "/p5"]),
    )
    .await;
    for i in 1..=5 {
        mount_page(
            &mock_server,
            &format!("/p{}", i),
            recipe_page(&format!("Page {}", i), 12, &["/deep"]),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let mut config = create_test_config(&base, &records, DiscoveryMode::Frontier);
    config.crawler.max_pages = 3;

    let stats = crawl(config, false, CancellationToken::new())
        .await
        .expect("Harvest failed");

    let pages: Vec<String> = requested_paths(&mock_server)
        .await
        .into_iter()
        .filter(|p| p != "/robots.txt")
        .collect();
    assert_eq!(pages, vec!["/", "/p1", "/p2"]);
    assert_eq!(stats.processed(), 3);
    assert_eq!(stored_lines(&records).len(), 3);
}

#[tokio::test]
async fn test_robots_disallow_respected() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nDisallow: /private\n").await;
    mount_page(
        &mock_server,
        "/",
        recipe_page("Home", 0, &["/private/secret", "/public"]),
    )
    .await;
    mount_page(&mock_server, "/public", recipe_page("Public", 12, &[])).await;
    mount_page(
        &mock_server,
        "/private/secret",
        recipe_page("Secret", 12, &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let config = create_test_config(&base, &records, DiscoveryMode::Frontier);

    crawl(config, false, CancellationToken::new())
        .await
        .expect("Harvest failed");

    let pages = requested_paths(&mock_server).await;
    assert!(pages.contains(&"/public".to_string()));
    assert!(!pages.iter().any(|p| p.starts_with("/private")));
}

#[tokio::test]
async fn test_min_fields_boundary() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/sitemap.xml",
        urlset(&[format!("{}/at-threshold", base), format!("{}/below", base)]),
    )
    .await;
    mount_page(&mock_server, "/at-threshold", recipe_page("Ten", 7, &[])).await;
    mount_page(&mock_server, "/below", recipe_page("Nine", 6, &[])).await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let mut config = create_test_config(&base, &records, DiscoveryMode::Sitemap);
    config.extraction.min_fields = 10;

    let stats = crawl(config, false, CancellationToken::new())
        .await
        .expect("Harvest failed");

    assert_eq!(stats.accepted(), 1);
    assert_eq!(stats.count(PageState::Rejected), 1);

    let lines = stored_lines(&records);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["title"], "Ten");
}

#[tokio::test]
async fn test_crawl_delay_and_user_agent() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let user_agent = "TestBot/1.0.0 (+https://example.com/contact; test@example.com)";

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", user_agent))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: TestBot\nCrawl-delay: 0.2\nAllow: /\n\nUser-agent: *\nDisallow: /\n\nSitemap: {}/sitemap.xml",
            base
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/sitemap.xml",
        urlset(&[format!("{}/a", base), format!("{}/b", base)]),
    )
    .await;
    mount_page(&mock_server, "/a", recipe_page("A", 12, &[])).await;
    mount_page(&mock_server, "/b", recipe_page("B", 12, &[])).await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let mut config = create_test_config(&base, &records, DiscoveryMode::Sitemap);
    config.crawler.delay_ms = None;

    let start = Instant::now();
    let stats = crawl(config, false, CancellationToken::new())
        .await
        .expect("Harvest failed");

    // robots.txt, sitemap, two pages: three paced gaps
    assert!(start.elapsed() >= Duration::from_millis(600));
    assert_eq!(stats.accepted(), 2);
}

#[tokio::test]
async fn test_auto_mode_falls_back_to_links() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", recipe_page("Home", 12, &["/soup"])).await;
    mount_page(&mock_server, "/soup", recipe_page("Soup", 12, &[])).await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let config = create_test_config(&base, &records, DiscoveryMode::Auto);

    let stats = crawl(config, false, CancellationToken::new())
        .await
        .expect("Harvest failed");

    assert_eq!(stats.sitemap_nodes_failed, 1);
    assert_eq!(stats.accepted(), 2);
}

#[tokio::test]
async fn test_unreachable_origin_aborts() {
    // Nothing listens on port 9 of localhost
    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let config = create_test_config("http://127.0.0.1:9", &records, DiscoveryMode::Frontier);

    let result = crawl(config, false, CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(sumi_harvest::HarvestError::OriginUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_cancelled_run_stops_cleanly() {
    let mock_server = MockServer::start().await;
    mount_sitemap_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("records.jsonl");
    let config = create_test_config(&mock_server.uri(), &records, DiscoveryMode::Sitemap);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = crawl(config, false, cancel).await.expect("Harvest failed");

    assert!(stats.cancelled);
    assert!(requested_paths(&mock_server).await.is_empty());
}
