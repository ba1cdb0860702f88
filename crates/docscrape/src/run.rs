//! Run orchestration
//!
//! A [`ScrapeRun`] owns every piece of mutable state for one site
//! scrape: the fetch client, the cancellation token, the claimed
//! filename map and the success counter. Runs never share state, so a
//! driving process may execute several concurrently without locking.

use crate::assemble::{self, EndReason, RunSummary};
use crate::client::{Fetch, HttpClient};
use crate::discover;
use crate::error::ScrapeError;
use crate::pipeline::{self, PageDocument};
use crate::DEFAULT_USER_AGENT;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Parameters for one scrape run, immutable once the run starts
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Base origin of the target site
    pub base_url: String,
    /// Directory receiving page documents and run artifacts
    pub output_dir: PathBuf,
    /// Seconds to wait between page fetches
    pub rate_limit: f64,
    /// Maximum number of pages to persist
    pub max_pages: usize,
    /// Identifying User-Agent sent with every request
    pub user_agent: String,
}

impl ScrapeConfig {
    /// Config with the original defaults: 1 s delay, 1000-page cap
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            output_dir: PathBuf::from("scraped_docs"),
            rate_limit: 1.0,
            max_pages: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// One site scrape with isolated mutable state
pub struct ScrapeRun {
    config: ScrapeConfig,
    fetch: Arc<dyn Fetch>,
    cancel: CancellationToken,
    claimed: HashMap<String, String>,
    successful: usize,
}

/// Open the run log file inside the output directory, appending
///
/// The driving layer points a log writer here so every run directory
/// carries its own `scraper.log` next to the summary and pages.
pub fn open_run_log(output_dir: &Path) -> Result<std::fs::File, ScrapeError> {
    std::fs::create_dir_all(output_dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_dir.join(assemble::LOG_FILENAME))?;
    Ok(file)
}

impl ScrapeRun {
    /// Create a run backed by a real HTTP client
    pub fn new(mut config: ScrapeConfig) -> Result<Self, ScrapeError> {
        if !config.rate_limit.is_finite() || config.rate_limit < 0.0 {
            return Err(ScrapeError::InvalidRateLimit(config.rate_limit));
        }
        let fetch = Arc::new(HttpClient::new(&config.user_agent)?);
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self::with_fetcher(config, fetch))
    }

    /// Create a run with an injected fetch capability
    pub fn with_fetcher(config: ScrapeConfig, fetch: Arc<dyn Fetch>) -> Self {
        Self {
            config,
            fetch,
            cancel: CancellationToken::new(),
            claimed: HashMap::new(),
            successful: 0,
        }
    }

    /// Token the driving layer may set to request a cooperative stop
    ///
    /// Checked once per page-loop iteration; a cancelled run still
    /// finalizes its summary and combined document.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Pages persisted so far in this run
    pub fn successful_scrapes(&self) -> usize {
        self.successful
    }

    /// Enumerate candidate URLs: sitemap-first, crawl fallback
    pub async fn discover_urls(&self) -> Result<Vec<String>, ScrapeError> {
        discover::discover_urls(
            self.fetch.as_ref(),
            &self.config.base_url,
            self.config.max_pages,
            self.delay(),
        )
        .await
    }

    /// Scrape one URL; success increments the run's counter
    pub async fn process_page(&mut self, url: &str) -> Result<PageDocument, ScrapeError> {
        let document = pipeline::process(
            self.fetch.as_ref(),
            url,
            &self.config.output_dir,
            &mut self.claimed,
        )
        .await?;
        self.successful += 1;
        Ok(document)
    }

    /// Execute the full run
    ///
    /// `urls` overrides discovery when provided. Individual page
    /// failures are logged and counted, never fatal; the summary and
    /// combined document are produced even when the loop stops early
    /// by cap or cancellation.
    pub async fn run(&mut self, urls: Option<Vec<String>>) -> Result<RunSummary, ScrapeError> {
        info!("Starting scraper for {}", self.config.base_url);
        info!("Output directory: {}", self.config.output_dir.display());
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let urls = match urls {
            Some(urls) => urls,
            None => self.discover_urls().await?,
        };
        if urls.is_empty() {
            return Err(ScrapeError::NoUrlsFound(self.config.base_url.clone()));
        }
        info!("Found {} URLs to scrape", urls.len());

        let mut ended_by = EndReason::Exhausted;
        for (index, url) in urls.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(
                    "Cancellation requested, stopping after {} pages",
                    self.successful
                );
                ended_by = EndReason::Cancelled;
                break;
            }
            if self.successful >= self.config.max_pages {
                warn!("Reached maximum page limit ({})", self.config.max_pages);
                ended_by = EndReason::PageCap;
                break;
            }

            info!("[{}/{}]", index + 1, urls.len());
            match self.process_page(url).await {
                Ok(document) => info!("Saved as {}", document.filename),
                Err(e) => warn!("{}", e),
            }

            tokio::time::sleep(self.delay()).await;
        }

        let summary = self.finalize(urls.len(), ended_by).await?;
        if summary.successful_scrapes > 0 {
            info!("Creating combined markdown file...");
            self.combine().await?;
        }
        info!(
            "Scraping complete! {}/{} pages scraped successfully",
            summary.successful_scrapes, summary.total_urls
        );
        Ok(summary)
    }

    /// Build and persist the run summary
    pub async fn finalize(
        &self,
        urls_considered: usize,
        ended_by: EndReason,
    ) -> Result<RunSummary, ScrapeError> {
        let summary = RunSummary {
            base_url: self.config.base_url.clone(),
            total_urls: urls_considered,
            successful_scrapes: self.successful,
            failed_scrapes: urls_considered.saturating_sub(self.successful),
            scraped_at: Utc::now(),
            rate_limit: self.config.rate_limit,
            max_pages: self.config.max_pages,
            ended_by,
        };
        assemble::write_summary(&self.config.output_dir, &summary).await?;
        Ok(summary)
    }

    /// Regenerate the combined document over everything persisted
    pub async fn combine(&self) -> Result<PathBuf, ScrapeError> {
        assemble::combine(&self.config.output_dir, &self.config.base_url).await
    }

    fn delay(&self) -> Duration {
        let secs = self.config.rate_limit;
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}
