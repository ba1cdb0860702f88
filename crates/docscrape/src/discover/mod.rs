//! URL discovery for a target site
//!
//! Sitemap resolution is tried first; breadth-first crawling is the
//! fallback when no sitemap yields anything.

pub mod crawl;
pub mod sitemap;

use crate::client::Fetch;
use crate::error::ScrapeError;
use std::time::Duration;
use tracing::info;

/// Enumerate candidate page URLs for `base_url`
///
/// Returns a sorted, deduplicated list. `max_pages` and `delay` only
/// apply to the crawl fallback; sitemap resolution is unbounded.
pub async fn discover_urls(
    fetch: &dyn Fetch,
    base_url: &str,
    max_pages: usize,
    delay: Duration,
) -> Result<Vec<String>, ScrapeError> {
    let urls = sitemap::resolve(fetch, base_url).await;

    let urls = if urls.is_empty() {
        info!("No sitemap found, starting crawl discovery...");
        crawl::discover(fetch, base_url, max_pages, delay).await?
    } else {
        urls
    };

    Ok(urls.into_iter().collect())
}
