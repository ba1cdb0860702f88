//! Run summary and combined-document assembly
//!
//! Produced once per run, after the page loop ends for any reason
//! (exhaustion, page cap, cancellation). The combined document is
//! regenerated wholesale each time, never incrementally updated.

use crate::error::ScrapeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filename of the structured run summary
pub const SUMMARY_FILENAME: &str = "scraping_summary.json";

/// Filename of the combined markdown artifact
pub const COMBINED_FILENAME: &str = "COMBINED_DOCUMENTATION.md";

/// Filename of the per-run log written next to the scraped pages
pub const LOG_FILENAME: &str = "scraper.log";

/// Why the page loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every discovered URL was attempted
    Exhausted,
    /// The successful-page cap was reached
    PageCap,
    /// Cancellation was requested and observed between pages
    Cancelled,
}

/// One run's final accounting, written once at run end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Site the run targeted
    pub base_url: String,
    /// URLs considered by the page loop
    pub total_urls: usize,
    /// Pages persisted successfully
    pub successful_scrapes: usize,
    /// Considered minus successful
    pub failed_scrapes: usize,
    /// When the summary was written
    pub scraped_at: DateTime<Utc>,
    /// Configured inter-request delay, in seconds
    pub rate_limit: f64,
    /// Configured page cap
    pub max_pages: usize,
    /// What ended the run
    pub ended_by: EndReason,
}

/// Write the run summary JSON into the output directory
pub async fn write_summary(output_dir: &Path, summary: &RunSummary) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(summary)?;
    tokio::fs::create_dir_all(output_dir).await?;
    tokio::fs::write(output_dir.join(SUMMARY_FILENAME), json).await?;
    Ok(())
}

/// Merge all persisted page documents into one combined file
///
/// Pages are ordered by filename for determinism; the summary and the
/// combined file itself are excluded. Returns the combined file path.
pub async fn combine(output_dir: &Path, base_url: &str) -> Result<PathBuf, ScrapeError> {
    let filenames = page_filenames(output_dir).await?;

    let mut combined = format!(
        "# Combined Documentation - {}\n\nGenerated on: {}\nTotal files: {}\n\n---\n\n",
        base_url,
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        filenames.len()
    );

    let banner = "=".repeat(80);
    for (index, filename) in filenames.iter().enumerate() {
        let content = tokio::fs::read_to_string(output_dir.join(filename)).await?;
        let title = frontmatter_title(&content).unwrap_or_else(|| title_from_filename(filename));

        combined.push_str(&format!(
            "\n\n{}\n## [{}] {}\nSource: {}\n{}\n\n",
            banner,
            index + 1,
            title,
            filename,
            banner
        ));
        combined.push_str(&content);
        combined.push_str("\n\n");
    }

    let path = output_dir.join(COMBINED_FILENAME);
    tokio::fs::write(&path, combined).await?;
    Ok(path)
}

/// All page document filenames, sorted, excluding assembler outputs
async fn page_filenames(output_dir: &Path) -> Result<Vec<String>, ScrapeError> {
    let mut filenames = Vec::new();
    let mut entries = tokio::fs::read_dir(output_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".md") && name != COMBINED_FILENAME && name != "README.md" {
            filenames.push(name);
        }
    }
    filenames.sort();
    Ok(filenames)
}

/// Extract the `title:` field from a document's frontmatter block
fn frontmatter_title(content: &str) -> Option<String> {
    let mut lines = content.lines();
    if lines.next()? != "---" {
        return None;
    }
    for line in lines {
        if line.starts_with("---") {
            break;
        }
        if let Some(value) = line.strip_prefix("title:") {
            let title = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

/// Fallback title derived from the filename stem
fn title_from_filename(filename: &str) -> String {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    stem.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
