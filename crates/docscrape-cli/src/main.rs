//! DocScrape CLI - scrape a documentation site into markdown files

use clap::Parser;
use docscrape::{open_run_log, RunRegistry, ScrapeConfig, ScrapeRun};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// DocScrape - universal documentation site scraper
#[derive(Parser, Debug)]
#[command(name = "docscrape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the documentation site to scrape
    url: String,

    /// Output directory for scraped markdown files
    #[arg(long, short, default_value = "scraped_docs")]
    output: PathBuf,

    /// Delay between requests in seconds
    #[arg(long, short, default_value_t = 1.0)]
    rate_limit: f64,

    /// Maximum number of pages to scrape
    #[arg(long, short, default_value_t = 1000)]
    max_pages: usize,

    /// Scrape only these URLs, skipping discovery
    #[arg(long, num_args = 1..)]
    urls: Option<Vec<String>>,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = ScrapeConfig::new(&cli.url);
    config.output_dir = cli.output;
    config.rate_limit = cli.rate_limit;
    config.max_pages = cli.max_pages;
    if let Some(ua) = cli.user_agent {
        config.user_agent = ua;
    }

    // The run directory keeps its own log next to the scraped pages.
    let log_file = match open_run_log(&config.output_dir) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    let mut run = match ScrapeRun::new(config) {
        Ok(run) => run,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let registry = RunRegistry::new();
    let entry = registry.create(&cli.url, run.cancellation_token());

    // First Ctrl-C requests a cooperative stop; the run still
    // finalizes its summary and combined document.
    let cancel = run.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current page...");
            cancel.cancel();
        }
    });

    match run.run(cli.urls).await {
        Ok(summary) => {
            registry.mark_completed(entry.id);
            info!(
                "Done: {}/{} pages in {}",
                summary.successful_scrapes,
                summary.total_urls,
                summary.base_url
            );
        }
        Err(e) => {
            registry.mark_failed(entry.id, &e.to_string());
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
