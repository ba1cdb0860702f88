//! HTTP fetch capability
//!
//! The scraping core consumes fetching through the [`Fetch`] trait so the
//! discovery and pipeline modules stay independent of the transport.
//! [`HttpClient`] is the reqwest-backed implementation used by real runs.

use crate::error::ScrapeError;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

/// Timeout for robots.txt and sitemap probes
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for page fetches
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// One fetched HTTP response
///
/// Transient: held only long enough to parse. Bodies are kept as raw
/// bytes because sitemap XML and HTML pages are decoded differently.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Bytes,
}

impl FetchedPage {
    /// Returns true for an HTTP 200 response
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// HTTP GET abstraction injected into the scraping core
///
/// Implementations must not retry: a failed fetch is abandoned
/// permanently for that URL within a run.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a URL with the given per-request timeout
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, ScrapeError>;
}

/// Reqwest-backed [`Fetch`] implementation
///
/// Built once per run with an identifying User-Agent so target sites
/// can attribute and rate-limit the scraper.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client sending the given User-Agent on every request
    pub fn new(user_agent: &str) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ScrapeError::ClientBuild)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, ScrapeError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ScrapeError::InvalidUrlScheme);
        }

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ScrapeError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::from_reqwest(url, e))?;

        Ok(FetchedPage { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_page_is_ok() {
        let page = FetchedPage {
            status: 200,
            body: Bytes::from_static(b"ok"),
        };
        assert!(page.is_ok());

        let page = FetchedPage {
            status: 404,
            body: Bytes::new(),
        };
        assert!(!page.is_ok());
    }

    #[test]
    fn test_fetched_page_text_lossy() {
        let page = FetchedPage {
            status: 200,
            body: Bytes::from_static(&[0x68, 0x69, 0xff]),
        };
        assert!(page.text().starts_with("hi"));
    }

    #[tokio::test]
    async fn test_invalid_scheme_rejected() {
        let client = HttpClient::new("test/1.0").unwrap();
        let result = client.fetch("ftp://example.com", PROBE_TIMEOUT).await;
        assert!(matches!(result, Err(ScrapeError::InvalidUrlScheme)));
    }
}
