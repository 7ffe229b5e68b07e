// src/engine/discover.rs
// =============================================================================
// Route discovery with a breadth-first crawl.
//
// How it works:
// 1. Start with the site URL in a queue
// 2. Fetch the page HTML
// 3. Extract all links from the page
// 4. Queue same-site page links (if not seen and within the depth limit)
// 5. Repeat until the queue is empty or max_routes pages were found
//
// Politeness:
// - Adds a short delay between requests
// - Never leaves the site's host
//
// Only pages that actually answered with HTML become routes; a dead link
// found on the site is not a route.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

const POLITE_DELAY: Duration = Duration::from_millis(100);

// Links ending in these are files, not pages.
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "pdf", "zip", "gz", "css", "js", "json",
    "xml", "txt", "mp4", "mp3", "woff", "woff2",
];

#[derive(Debug, Clone)]
struct CrawlItem {
    url: Url,
    depth: usize,
}

/// Crawls `start` and returns the page URLs found, the start page first.
///
/// max_depth = 1 only checks the start page, 2 adds the pages it links to,
/// and so on.
pub async fn discover_routes(
    client: &Client,
    start: &Url,
    max_depth: usize,
    max_routes: usize,
) -> Vec<Url> {
    let start = normalize(start.clone());

    let mut queue = VecDeque::new();
    queue.push_back(CrawlItem {
        url: start.clone(),
        depth: 1,
    });

    let mut seen = HashSet::new();
    seen.insert(start.to_string());

    let mut routes = Vec::new();

    while let Some(item) = queue.pop_front() {
        if routes.len() >= max_routes {
            break;
        }

        debug!(depth = item.depth, url = %item.url, "crawling");

        let html = match fetch_page(client, &item.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %item.url, error = %e, "skipping route that failed to load");
                continue;
            }
        };

        routes.push(item.url.clone());

        if item.depth < max_depth {
            for link in extract_same_site_links(&html, &item.url, &start) {
                if seen.insert(link.to_string()) {
                    queue.push_back(CrawlItem {
                        url: link,
                        depth: item.depth + 1,
                    });
                }
            }
        }

        if !queue.is_empty() {
            tokio::time::sleep(POLITE_DELAY).await;
        }
    }

    routes
}

// Fetches a page and returns its body if it is a successful HTML response
async fn fetch_page(client: &Client, url: &Url) -> Result<String, String> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("html"))
        // No content type at all: give the body a chance.
        .unwrap_or(true);
    if !is_html {
        return Err("not an HTML page".to_string());
    }

    response.text().await.map_err(|e| e.to_string())
}

/// Extracts links from `html` that point to pages on the same site as `site`.
fn extract_same_site_links(html: &str, page_url: &Url, site: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("constant selector is valid");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(page_url, href))
        .filter(|url| same_site(url, site) && looks_like_page(url))
        .collect()
}

// Resolves a link (possibly relative) to an absolute URL without fragment
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    Some(normalize(url))
}

fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

fn same_site(url: &Url, site: &Url) -> bool {
    url.host_str() == site.host_str() && url.port_or_known_default() == site.port_or_known_default()
}

fn looks_like_page(url: &Url) -> bool {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((_, ext)) => !ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let base = url("https://example.com/page");
        assert_eq!(resolve_link(&base, "/docs"), Some(url("https://example.com/docs")));
    }

    #[test]
    fn test_resolve_strips_fragment() {
        let base = url("https://example.com/");
        assert_eq!(
            resolve_link(&base, "/guide#install"),
            Some(url("https://example.com/guide"))
        );
    }

    #[test]
    fn test_skip_anchor_and_special_schemes() {
        let base = url("https://example.com/page");
        assert_eq!(resolve_link(&base, "#section"), None);
        assert_eq!(resolve_link(&base, "mailto:test@example.com"), None);
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base, "ftp://example.com/file"), None);
    }

    #[test]
    fn test_extract_keeps_same_site_pages_only() {
        let html = r#"
            <a href="/about">About</a>
            <a href="https://example.com/blog/">Blog</a>
            <a href="https://other.com/">Elsewhere</a>
            <a href="http://example.com:8080/alt">Other port</a>
            <a href="/logo.png">Logo</a>
            <a href="/report.PDF">Report</a>
        "#;
        let site = url("https://example.com/");
        let links = extract_same_site_links(html, &site, &site);

        assert_eq!(
            links,
            vec![url("https://example.com/about"), url("https://example.com/blog/")]
        );
    }

    #[test]
    fn test_looks_like_page() {
        assert!(looks_like_page(&url("https://example.com/")));
        assert!(looks_like_page(&url("https://example.com/docs/v1.2")));
        assert!(looks_like_page(&url("https://example.com/index.html")));
        assert!(!looks_like_page(&url("https://example.com/app.js")));
    }

    #[test]
    fn test_same_site_compares_default_ports() {
        assert!(same_site(&url("https://example.com:443/a"), &url("https://example.com/")));
        assert!(!same_site(&url("https://sub.example.com/"), &url("https://example.com/")));
    }
}
