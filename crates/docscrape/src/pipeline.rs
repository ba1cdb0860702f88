//! Per-page scrape pipeline
//!
//! fetch -> extract -> convert -> persist for one URL. Every step is a
//! soft-failure point: the error is returned for that URL and the
//! caller's run loop continues.

use crate::client::{Fetch, PAGE_TIMEOUT};
use crate::convert::convert;
use crate::error::ScrapeError;
use crate::extract::extract;
use chrono::{DateTime, Utc};
use scraper::Html;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use url::Url;

/// Version stamped into every page document's frontmatter
pub const SCRAPER_VERSION: &str = "1.0.0";

/// One persisted page, never mutated after creation
#[derive(Debug, Clone, Serialize)]
pub struct PageDocument {
    /// URL the page was fetched from
    pub source_url: String,
    /// Extracted page title
    pub title: String,
    /// Capture timestamp
    pub scraped_at: DateTime<Utc>,
    /// Filename the document was persisted under
    pub filename: String,
    /// Converted markdown body
    pub markdown_body: String,
}

/// Scrape one URL and persist the resulting page document
///
/// `claimed` maps already-written filenames to their source URLs; a
/// collision with a different URL is disambiguated with a hash suffix
/// rather than silently overwriting earlier output.
pub async fn process(
    fetch: &dyn Fetch,
    url: &str,
    output_dir: &Path,
    claimed: &mut HashMap<String, String>,
) -> Result<PageDocument, ScrapeError> {
    info!("Scraping: {}", url);

    let page = fetch.fetch(url, PAGE_TIMEOUT).await?;
    if !page.is_ok() {
        return Err(ScrapeError::HttpStatus {
            url: url.to_string(),
            status: page.status,
        });
    }

    let (title, markdown_body) = extract_and_convert(url, &page.text())?;
    let filename = claim_filename(url, claimed);

    let document = PageDocument {
        source_url: url.to_string(),
        title,
        scraped_at: Utc::now(),
        filename,
        markdown_body,
    };

    tokio::fs::create_dir_all(output_dir).await?;
    tokio::fs::write(output_dir.join(&document.filename), render_document(&document)).await?;

    Ok(document)
}

/// Parse, extract and convert a fetched page body
///
/// Kept synchronous so the parsed document never lives across an await
/// point.
fn extract_and_convert(url: &str, html: &str) -> Result<(String, String), ScrapeError> {
    let mut document = Html::parse_document(html);
    let extraction = extract(&mut document);
    let body = extraction
        .body
        .ok_or_else(|| ScrapeError::NoContent(url.to_string()))?;
    Ok((extraction.title, convert(&document, body)))
}

/// Derive the output filename for a URL, deterministically
///
/// The origin and surrounding slashes are stripped, characters outside
/// `[A-Za-z0-9_./-]` become `_`, remaining path separators become `_`,
/// and a `.md` suffix is ensured. An empty path maps to `index.md`.
/// Trailing-slash variants of the same path intentionally map to the
/// same file.
pub fn derive_filename(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let path = path.trim_matches('/');

    if path.is_empty() {
        return "index.md".to_string();
    }

    let mut filename: String = path
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    filename = filename.replace('/', "_");

    if !filename.ends_with(".md") {
        filename.push_str(".md");
    }
    filename
}

/// Reserve a filename for `url`, hash-suffixing collisions
fn claim_filename(url: &str, claimed: &mut HashMap<String, String>) -> String {
    let mut filename = derive_filename(url);
    if let Some(owner) = claimed.get(&filename) {
        if owner != url {
            let suffixed = hash_suffixed(&filename, url);
            warn!(
                "Filename {} already written for {}, saving {} as {}",
                filename, owner, url, suffixed
            );
            filename = suffixed;
        }
    }
    claimed.insert(filename.clone(), url.to_string());
    filename
}

/// Append an 8-hex-char URL digest before the `.md` suffix
fn hash_suffixed(filename: &str, url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hash: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    format!("{}-{}.md", stem, hash)
}

/// Render the persisted form: frontmatter, title heading, body
fn render_document(document: &PageDocument) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("title: {}\n", document.title));
    out.push_str(&format!("source_url: {}\n", document.source_url));
    out.push_str(&format!(
        "scraped_at: {}\n",
        document.scraped_at.to_rfc3339()
    ));
    out.push_str(&format!("scraper_version: {}\n", SCRAPER_VERSION));
    out.push_str("---\n\n");
    out.push_str(&format!("# {}\n\n", document.title));
    out.push_str(&document.markdown_body);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StaticFetch;
    use tempfile::TempDir;

    #[test]
    fn test_derive_filename_is_deterministic() {
        let url = "https://example.com/guide/intro";
        assert_eq!(derive_filename(url), derive_filename(url));
        assert_eq!(derive_filename(url), "guide_intro.md");
    }

    #[test]
    fn test_derive_filename_trailing_slash_equivalence() {
        // Documented equivalence: trailing-slash variants share a file.
        assert_eq!(
            derive_filename("https://example.com/guide/intro"),
            derive_filename("https://example.com/guide/intro/")
        );
    }

    #[test]
    fn test_derive_filename_root_is_index() {
        assert_eq!(derive_filename("https://example.com"), "index.md");
        assert_eq!(derive_filename("https://example.com/"), "index.md");
    }

    #[test]
    fn test_derive_filename_sanitizes() {
        assert_eq!(
            derive_filename("https://example.com/api/v2/things%20stuff"),
            "api_v2_things_20stuff.md"
        );
    }

    #[test]
    fn test_derive_filename_keeps_md_suffix() {
        assert_eq!(
            derive_filename("https://example.com/notes/readme.md"),
            "notes_readme.md"
        );
    }

    #[test]
    fn test_claim_filename_disambiguates_collisions() {
        let mut claimed = HashMap::new();
        let a = claim_filename("https://example.com/guide?page=1", &mut claimed);
        let b = claim_filename("https://example.com/guide?page=2", &mut claimed);
        assert_ne!(a, b);
        assert!(b.ends_with(".md"));

        // Re-claiming the same URL keeps its filename.
        let again = claim_filename("https://example.com/guide?page=1", &mut claimed);
        assert_eq!(a, again);
    }

    #[test]
    fn test_render_document_layout() {
        let document = PageDocument {
            source_url: "https://example.com/guide".to_string(),
            title: "Guide".to_string(),
            scraped_at: Utc::now(),
            filename: "guide.md".to_string(),
            markdown_body: "Some body.".to_string(),
        };
        let rendered = render_document(&document);
        assert!(rendered.starts_with("---\ntitle: Guide\n"));
        assert!(rendered.contains("source_url: https://example.com/guide\n"));
        assert!(rendered.contains("scraper_version: 1.0.0\n"));
        assert!(rendered.contains("\n# Guide\n\nSome body."));
    }

    #[tokio::test]
    async fn test_multiline_title_stays_on_one_frontmatter_line() {
        let html = "<title>Getting\n  Started</title><body><main><p>hello</p></main></body>";
        let fetch = StaticFetch::new().with("https://example.com/start", 200, html);
        let dir = TempDir::new().unwrap();
        let mut claimed = HashMap::new();

        let document = process(&fetch, "https://example.com/start", dir.path(), &mut claimed)
            .await
            .unwrap();
        assert_eq!(document.title, "Getting Started");

        let written = std::fs::read_to_string(dir.path().join("start.md")).unwrap();
        assert!(written.starts_with("---\ntitle: Getting Started\nsource_url:"));
    }

    #[tokio::test]
    async fn test_process_persists_page() {
        let html = "<title>Intro</title><body><main><p>Welcome to the docs.</p></main></body>";
        let fetch = StaticFetch::new().with("https://example.com/intro", 200, html);
        let dir = TempDir::new().unwrap();
        let mut claimed = HashMap::new();

        let document = process(&fetch, "https://example.com/intro", dir.path(), &mut claimed)
            .await
            .unwrap();

        assert_eq!(document.title, "Intro");
        assert_eq!(document.filename, "intro.md");
        let written = std::fs::read_to_string(dir.path().join("intro.md")).unwrap();
        assert!(written.contains("Welcome to the docs."));
    }

    #[tokio::test]
    async fn test_process_non_200_is_soft_failure() {
        let fetch = StaticFetch::new().with("https://example.com/gone", 404, "not found");
        let dir = TempDir::new().unwrap();
        let mut claimed = HashMap::new();

        let result = process(&fetch, "https://example.com/gone", dir.path(), &mut claimed).await;
        assert!(matches!(
            result,
            Err(ScrapeError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_process_without_content_fails_softly() {
        // parse_document always synthesizes a body element, so the
        // empty-content path needs a page whose body is removed chrome.
        let html = r#"<body><nav>only navigation</nav></body>"#;
        let fetch = StaticFetch::new().with("https://example.com/empty", 200, html);
        let dir = TempDir::new().unwrap();
        let mut claimed = HashMap::new();

        let document = process(&fetch, "https://example.com/empty", dir.path(), &mut claimed)
            .await
            .unwrap();
        // Body fallback still applies; the converted content is empty.
        assert!(document.markdown_body.is_empty());
    }
}
