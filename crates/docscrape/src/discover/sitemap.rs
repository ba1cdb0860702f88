//! Sitemap resolution
//!
//! Finds page URLs declared through XML sitemaps: locations named in
//! robots.txt plus a fixed list of conventional paths, with sitemap
//! indexes expanded recursively. Every per-location failure (404,
//! timeout, malformed XML) degrades to an empty result for that
//! location and is logged, never fatal.

use crate::client::{Fetch, PROBE_TIMEOUT};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;
use url::Url;

/// Conventional sitemap paths probed regardless of robots.txt outcome
const SITEMAP_LOCATIONS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemaps/sitemap.xml",
];

/// A parsed sitemap document
///
/// `nested` is non-empty for a sitemap index; `pages` holds leaf URLs.
#[derive(Debug, Default, PartialEq)]
struct SitemapXml {
    nested: Vec<String>,
    pages: Vec<String>,
}

/// Resolve all page URLs reachable through the site's sitemaps
///
/// Locations are processed as an iterative worklist with a visited
/// set, so cyclic or self-referencing sitemap indexes terminate.
pub async fn resolve(fetch: &dyn Fetch, base_url: &str) -> BTreeSet<String> {
    let mut pending: Vec<String> = Vec::new();

    // robots.txt may declare sitemap locations
    if let Some(robots_url) = join_base(base_url, "/robots.txt") {
        match fetch.fetch(&robots_url, PROBE_TIMEOUT).await {
            Ok(page) if page.is_ok() => {
                pending.extend(sitemaps_from_robots(&page.text()));
            }
            Ok(page) => debug!("robots.txt returned HTTP {}", page.status),
            Err(e) => debug!("Could not fetch robots.txt: {}", e),
        }
    }

    // Conventional locations are probed either way
    for path in SITEMAP_LOCATIONS {
        if let Some(url) = join_base(base_url, path) {
            pending.push(url);
        }
    }

    let mut urls = BTreeSet::new();
    let mut visited: HashSet<String> = HashSet::new();

    while let Some(location) = pending.pop() {
        if !visited.insert(location.clone()) {
            continue;
        }
        let Some(sitemap) = fetch_sitemap(fetch, &location).await else {
            continue;
        };
        if !sitemap.nested.is_empty() {
            debug!(
                "Sitemap index at {} references {} sitemaps",
                location,
                sitemap.nested.len()
            );
            pending.extend(sitemap.nested);
        }
        urls.extend(sitemap.pages);
    }

    urls
}

/// Fetch and parse one sitemap location, degrading failures to `None`
async fn fetch_sitemap(fetch: &dyn Fetch, location: &str) -> Option<SitemapXml> {
    let page = match fetch.fetch(location, PROBE_TIMEOUT).await {
        Ok(page) if page.is_ok() => page,
        Ok(page) => {
            debug!("Sitemap {} returned HTTP {}", location, page.status);
            return None;
        }
        Err(e) => {
            debug!("Could not fetch sitemap {}: {}", location, e);
            return None;
        }
    };

    match parse_sitemap_xml(&page.text()) {
        Ok(sitemap) => Some(sitemap),
        Err(e) => {
            debug!("Could not parse sitemap {}: {}", location, e);
            None
        }
    }
}

/// Scan robots.txt lines for `Sitemap:` directives, case-insensitively
fn sitemaps_from_robots(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if !line.to_lowercase().starts_with("sitemap:") {
                return None;
            }
            line.split_once(':')
                .map(|(_, value)| value.trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .collect()
}

/// Parse a sitemap or sitemap-index document
///
/// `<loc>` values are collected under their enclosing `<sitemap>` or
/// `<url>` entry; element namespaces are ignored.
fn parse_sitemap_xml(xml: &str) -> Result<SitemapXml, quick_xml::Error> {
    #[derive(PartialEq)]
    enum Scope {
        None,
        SitemapEntry,
        UrlEntry,
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut result = SitemapXml::default();
    let mut scope = Scope::None;
    let mut in_loc = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemap" => scope = Scope::SitemapEntry,
                b"url" => scope = Scope::UrlEntry,
                b"loc" => in_loc = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"sitemap" | b"url" => scope = Scope::None,
                b"loc" => in_loc = false,
                _ => {}
            },
            Event::Text(t) if in_loc => {
                let loc = t.unescape()?.trim().to_string();
                if !loc.is_empty() {
                    match scope {
                        Scope::SitemapEntry => result.nested.push(loc),
                        Scope::UrlEntry => result.pages.push(loc),
                        Scope::None => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(result)
}

/// Resolve a path against the base URL, `urljoin`-style
fn join_base(base_url: &str, path: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .and_then(|base| base.join(path).ok())
        .map(|url| url.to_string())
}
