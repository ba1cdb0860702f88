//! Test doubles shared across module tests

use crate::client::{Fetch, FetchedPage};
use crate::error::ScrapeError;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

/// Canned-response fetcher backed by a URL map
///
/// Unknown URLs fail with a request error, standing in for a site
/// that does not serve the path at all.
#[derive(Default)]
pub(crate) struct StaticFetch {
    responses: HashMap<String, FetchedPage>,
}

impl StaticFetch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchedPage {
                status,
                body: Bytes::from(body.to_string()),
            },
        );
        self
    }
}

#[async_trait]
impl Fetch for StaticFetch {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedPage, ScrapeError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Request {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}
