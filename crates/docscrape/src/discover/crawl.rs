//! Breadth-first crawl discovery
//!
//! Fallback strategy when sitemap resolution yields nothing: walk the
//! site from the base URL, following same-origin anchors only and
//! skipping known binary file extensions. Traversal is strictly
//! sequential with a fixed courtesy delay after each fetched page.

use crate::client::{Fetch, PAGE_TIMEOUT};
use crate::error::ScrapeError;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// File extensions never worth fetching as documents
const BINARY_EXTENSIONS: &[&str] = &[".pdf", ".zip", ".png", ".jpg", ".gif"];

/// Discover page URLs by breadth-first traversal from `base_url`
///
/// Stops when the queue empties or `max_pages` URLs have been
/// discovered. Fetch failures and non-200 responses are logged and
/// dropped with no retry.
pub async fn discover(
    fetch: &dyn Fetch,
    base_url: &str,
    max_pages: usize,
    delay: Duration,
) -> Result<BTreeSet<String>, ScrapeError> {
    let base = Url::parse(base_url).map_err(|_| ScrapeError::InvalidUrl(base_url.to_string()))?;

    let mut discovered: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    // Seed with the parsed serialization so the root and links joined
    // back to it compare equal ("http://host" vs "http://host/").
    queue.push_back(base.to_string());

    while let Some(url) = queue.pop_front() {
        if discovered.len() >= max_pages {
            debug!("Crawl discovery reached the page limit ({})", max_pages);
            break;
        }
        if discovered.contains(&url) {
            continue;
        }

        let page = match fetch.fetch(&url, PAGE_TIMEOUT).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Error crawling {}: {}", url, e);
                continue;
            }
        };
        if !page.is_ok() {
            warn!("HTTP {} while crawling {}", page.status, url);
            continue;
        }

        discovered.insert(url.clone());

        for link in page_links(&page.text(), &url) {
            if !discovered.contains(&link)
                && same_origin(&base, &link)
                && !has_binary_extension(&link)
            {
                queue.push_back(link);
            }
        }

        tokio::time::sleep(delay).await;
    }

    Ok(discovered)
}

/// All anchor hrefs on a page, resolved against the page's own URL
fn page_links(html: &str, page_url: &str) -> Vec<String> {
    let Ok(current) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| current.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}

/// Explicit scheme + host + port equality, not a prefix check
fn same_origin(base: &Url, candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            url.scheme() == base.scheme()
                && url.host_str() == base.host_str()
                && url.port_or_known_default() == base.port_or_known_default()
        }
        Err(_) => false,
    }
}

/// True if the URL path ends in a known binary extension
fn has_binary_extension(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_else(|_| url.to_lowercase());
    BINARY_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StaticFetch;

    #[test]
    fn test_same_origin_rejects_prefix_tricks() {
        let base = Url::parse("https://example.com").unwrap();
        assert!(same_origin(&base, "https://example.com/docs"));
        assert!(!same_origin(&base, "https://example.com.evil.com/docs"));
        assert!(!same_origin(&base, "http://example.com/docs"));
        assert!(!same_origin(&base, "https://other.com/docs"));
    }

    #[test]
    fn test_binary_extension_filter() {
        assert!(has_binary_extension("https://example.com/manual.pdf"));
        assert!(has_binary_extension("https://example.com/logo.PNG"));
        assert!(!has_binary_extension("https://example.com/guide"));
        assert!(!has_binary_extension("https://example.com/page.html"));
    }

    #[test]
    fn test_page_links_resolve_relative_hrefs() {
        let html = r#"<body><a href="/a">a</a><a href="b">b</a><a href="https://other.com/c">c</a></body>"#;
        let links = page_links(html, "https://example.com/docs/start");
        assert!(links.contains(&"https://example.com/a".to_string()));
        assert!(links.contains(&"https://example.com/docs/b".to_string()));
        assert!(links.contains(&"https://other.com/c".to_string()));
    }

    #[tokio::test]
    async fn test_discover_stays_on_origin() {
        let fetch = StaticFetch::new()
            .with(
                "https://example.com/",
                200,
                r#"<body><a href="/one">1</a><a href="https://evil.com/x">x</a></body>"#,
            )
            .with("https://example.com/one", 200, "<body>leaf</body>");

        let urls = discover(&fetch, "https://example.com/", 10, Duration::ZERO)
            .await
            .unwrap();
        assert!(urls.contains("https://example.com/"));
        assert!(urls.contains("https://example.com/one"));
        assert!(!urls.iter().any(|u| u.contains("evil.com")));
    }

    #[tokio::test]
    async fn test_discover_honors_max_pages() {
        let fetch = StaticFetch::new()
            .with(
                "https://example.com/",
                200,
                r#"<body><a href="/a">a</a><a href="/b">b</a><a href="/c">c</a></body>"#,
            )
            .with("https://example.com/a", 200, "<body>a</body>")
            .with("https://example.com/b", 200, "<body>b</body>")
            .with("https://example.com/c", 200, "<body>c</body>");

        let urls = discover(&fetch, "https://example.com/", 2, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_discover_drops_failed_pages() {
        let fetch = StaticFetch::new().with(
            "https://example.com/",
            200,
            r#"<body><a href="/gone">gone</a></body>"#,
        );

        let urls = discover(&fetch, "https://example.com/", 10, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(urls.len(), 1);
    }
}
