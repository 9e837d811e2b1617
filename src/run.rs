//! One scrape: obtain the page, extract the listing, persist the document.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::extractor::{ExtractOptions, ScrapeResult, extract};
use crate::fetcher::{HttpFetcher, decode_document};
use crate::storage::{self, OutputPaths};

/// Where the listing page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Remote(String),
    /// A page saved earlier; the configured source URL is still recorded
    /// in the metadata.
    File(PathBuf),
}

#[derive(Debug)]
pub struct LoadedPage {
    pub html: String,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
}

pub async fn load_page(
    source: &PageSource,
    canonical_url: &str,
    timeout: Duration,
) -> Result<LoadedPage, ScrapeError> {
    match source {
        PageSource::Remote(url) => {
            let fetcher = HttpFetcher::new(timeout)?;
            let response = fetcher.fetch(url).await?;
            Ok(LoadedPage {
                html: response.page.html,
                source_url: url.clone(),
                fetched_at: response.fetched_at,
            })
        }
        PageSource::File(path) => {
            let bytes = tokio::fs::read(path).await?;
            let page = decode_document(None, &bytes);
            info!(path = %path.display(), charset = page.charset(), "page read from file");
            Ok(LoadedPage {
                html: page.html,
                source_url: canonical_url.to_string(),
                fetched_at: Utc::now(),
            })
        }
    }
}

/// Loads and extracts, without writing anything.
#[instrument(skip(config), fields(strategy = %config.strategy()))]
pub async fn scrape(config: &Config, source: &PageSource) -> Result<ScrapeResult, ScrapeError> {
    let page = load_page(source, config.source_url(), config.timeout()).await?;

    let options = ExtractOptions {
        strategy: config.strategy(),
        source_url: page.source_url,
        today: page.fetched_at.date_naive(),
        fetched_at: page.fetched_at,
    };
    let result = extract(&page.html, &options)?;

    info!(
        week_start = %result.metadata.week_start,
        week_end = %result.metadata.week_end,
        zones = result.zones.len(),
        pharmacies = result.pharmacy_count(),
        "listing extracted"
    );
    Ok(result)
}

/// Full run: scrape, back up the previous document and write the new one.
pub async fn scrape_and_save(
    config: &Config,
    source: &PageSource,
) -> Result<ScrapeResult, ScrapeError> {
    let result = scrape(config, source).await?;
    storage::save(&OutputPaths::in_dir(config.output_dir()), &result)?;
    Ok(result)
}
