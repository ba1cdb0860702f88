//! DocScrape - documentation site scraping library
//!
//! This crate turns a documentation site into a directory of markdown
//! files. A run discovers page URLs (sitemaps first, breadth-first
//! crawl as fallback), extracts the main content container from each
//! page, converts it to markdown and persists it with frontmatter,
//! then writes a run summary and a combined document.
//!
//! ## Run model
//!
//! [`ScrapeRun`] owns all mutable state for one site, so concurrent
//! runs against different sites need no shared locking. The driving
//! layer tracks runs in a [`RunRegistry`] and stops them cooperatively
//! through their cancellation tokens.

pub mod assemble;
pub mod client;
mod convert;
mod discover;
mod error;
mod extract;
mod pipeline;
mod registry;
mod run;
#[cfg(test)]
pub(crate) mod testutil;

pub use assemble::{EndReason, RunSummary, COMBINED_FILENAME, LOG_FILENAME, SUMMARY_FILENAME};
pub use client::{Fetch, FetchedPage, HttpClient, PAGE_TIMEOUT, PROBE_TIMEOUT};
pub use convert::{convert, normalize_blank_lines};
pub use error::ScrapeError;
pub use extract::{extract, Extraction};
pub use pipeline::{derive_filename, process, PageDocument, SCRAPER_VERSION};
pub use registry::{RunEntry, RunRegistry, RunStatus};
pub use run::{open_run_log, ScrapeConfig, ScrapeRun};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; DocScrape/1.0; +https://github.com/docscrape/docscrape)";
