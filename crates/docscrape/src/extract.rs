//! Content extraction heuristics
//!
//! Two-phase extraction: chrome elements (navigation, sidebars,
//! footers, feedback widgets) are removed from the parsed document in
//! place, then the main content container is picked from a
//! priority-ordered selector list. Platform-specific markers are tried
//! before generic fallbacks so that `main` never shadows a more
//! precise match like a Docusaurus or MkDocs container.

use ego_tree::NodeId;
use scraper::{Html, Selector};
use tracing::warn;

/// Elements stripped from every page before content selection
const REMOVE_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "footer",
    ".sidebar",
    ".navigation",
    ".toc",
    ".breadcrumbs",
    ".edit-page",
    ".feedback",
    ".rating",
    "[class*=\"sidebar\"]",
    "[class*=\"navigation\"]",
    "[class*=\"footer\"]",
];

/// Content container selectors, most platform-specific first
///
/// Order is the contract: the first selector that matches anything
/// wins, so generic selectors must stay at the tail.
const CONTENT_SELECTORS: &[&str] = &[
    // Readme.com
    ".readme-content",
    "[data-testid=\"readme-content\"]",
    ".hub-content-body",
    // GitBook
    ".markdown-section",
    ".page-wrapper",
    // Docusaurus
    ".markdown",
    "article",
    ".docMainContainer",
    // MkDocs
    ".md-content",
    ".content",
    // Sphinx
    ".document",
    ".body",
    // Generic
    "main",
    "[role=\"main\"]",
    ".main-content",
    ".documentation-content",
    "#content",
    ".content-wrapper",
];

/// Title used when a page has no `<title>` element
const DEFAULT_TITLE: &str = "Untitled";

/// Result of extracting one page
///
/// An absent `body` means the page contributes nothing; callers treat
/// it as a soft failure for that URL, not an error.
#[derive(Debug)]
pub struct Extraction {
    /// Trimmed document title, or `"Untitled"`
    pub title: String,
    /// Node id of the selected content subtree, if any
    pub body: Option<NodeId>,
}

/// Extract the title and main content subtree from a parsed page
///
/// Mutates the document: removal-phase subtrees are detached before
/// selection runs, so an element matching both a removal selector and
/// a content selector is never returned.
pub fn extract(document: &mut Html) -> Extraction {
    let title = extract_title(document);

    remove_chrome(document);

    for selector in parse_selectors(CONTENT_SELECTORS) {
        if let Some(element) = document.select(&selector).next() {
            return Extraction {
                title,
                body: Some(element.id()),
            };
        }
    }

    // Fallback: the whole document body
    let body = parse_selectors(&["body"])
        .into_iter()
        .find_map(|selector| document.select(&selector).next().map(|el| el.id()));

    Extraction { title, body }
}

/// Whitespace-collapsed `<title>` text, defaulting when absent or empty
///
/// Internal newlines and runs of spaces become single spaces so the
/// title stays a single frontmatter line.
fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return DEFAULT_TITLE.to_string();
    };
    let title = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

/// Detach every subtree matching a removal selector
fn remove_chrome(document: &mut Html) {
    for selector in parse_selectors(REMOVE_SELECTORS) {
        let ids: Vec<NodeId> = document.select(&selector).map(|el| el.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Parse a static selector list, skipping (and logging) invalid entries
fn parse_selectors(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Failed to parse selector '{}': {}", s, e);
                None
            }
        })
        .collect()
}
