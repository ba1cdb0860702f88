//! Error types for DocScrape

use thiserror::Error;

/// Errors that can occur while discovering or scraping pages
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Base URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// Rate limit is negative or not finite
    #[error("Invalid rate limit: {0} (must be a finite number of seconds >= 0)")]
    InvalidRateLimit(f64),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out for {0}")]
    Timeout(String),

    /// Failed to connect to server
    #[error("Failed to connect to {url}")]
    Connect {
        /// URL that was being fetched
        url: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Other request error
    #[error("Request failed for {url}: {message}")]
    Request {
        /// URL that was being fetched
        url: String,
        /// Error description
        message: String,
    },

    /// Page responded with a non-200 status
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// URL that was fetched
        url: String,
        /// Response status code
        status: u16,
    },

    /// No content container could be extracted from the page
    #[error("No extractable content for {0}")]
    NoContent(String),

    /// Discovery produced no URLs at all
    #[error("No URLs found to scrape for {0}")]
    NoUrlsFound(String),

    /// Filesystem failure while persisting output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Summary serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Classify a reqwest error for the given URL
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeError::Timeout(url.to_string())
        } else if err.is_connect() {
            ScrapeError::Connect {
                url: url.to_string(),
                source: err,
            }
        } else {
            ScrapeError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
