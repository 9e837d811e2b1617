pub mod aggregate;
pub mod builder;
pub mod dates;
pub mod errors;
pub mod fields;
pub mod model;
pub mod normalizer;
pub mod segment;
pub mod zones;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use scraper::Html;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use errors::ExtractError;
pub use model::ScrapeResult;

use crate::extractor::builder::{RawPharmacy, build_pharmacies};
use crate::extractor::dates::extract_week;
use crate::extractor::model::Metadata;
use crate::extractor::normalizer::{content_root, element_lines};
use crate::extractor::segment::{LineSegmenter, Segmenter, TagSegmenter};

/// Which detection strategy reads the listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Lines first, markup when lines find no pharmacy inside a zone.
    #[default]
    Auto,
    Lines,
    Tags,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown strategy {0:?}, expected one of auto, lines, tags")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "lines" | "line" => Ok(Self::Lines),
            "tags" | "tag" => Ok(Self::Tags),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Lines => "lines",
            Self::Tags => "tags",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub strategy: Strategy,
    pub source_url: String,
    /// Reference day for the week fallback.
    pub today: NaiveDate,
    pub fetched_at: DateTime<Utc>,
}

impl ExtractOptions {
    pub fn new(source_url: impl Into<String>, strategy: Strategy) -> Self {
        let fetched_at = Utc::now();
        Self {
            strategy,
            source_url: source_url.into(),
            today: fetched_at.date_naive(),
            fetched_at,
        }
    }
}

/// Turns the listing page into the structured document.
#[instrument(skip(html, options), fields(strategy = %options.strategy, bytes = html.len()))]
pub fn extract(html: &str, options: &ExtractOptions) -> Result<ScrapeResult, ExtractError> {
    let document = Html::parse_document(html);

    // the week line may sit outside the listing container
    let page_text = element_lines(document.root_element()).join("\n");
    let week = extract_week(&page_text, options.today);

    let root = content_root(&document)?;

    let raw_pharmacies = match options.strategy {
        Strategy::Lines => run(&LineSegmenter, root),
        Strategy::Tags => run(&TagSegmenter, root),
        Strategy::Auto => {
            let found = run(&LineSegmenter, root);
            if !found.iter().any(|pharmacy| pharmacy.zone.is_some()) {
                warn!("line detection found no pharmacy, retrying with markup detection");
                run(&TagSegmenter, root)
            } else {
                found
            }
        }
    };

    let metadata = Metadata {
        week_start: week.start,
        week_end: week.end,
        source_url: options.source_url.clone(),
        last_updated: options.fetched_at,
    };

    aggregate::assemble(metadata, raw_pharmacies)
}

fn run(segmenter: &dyn Segmenter, root: scraper::ElementRef<'_>) -> Vec<RawPharmacy> {
    let segments = segmenter.segments(root);
    debug!(
        strategy = segmenter.name(),
        segments = segments.len(),
        "page segmented"
    );

    let pharmacies = build_pharmacies(segments);
    info!(
        strategy = segmenter.name(),
        pharmacies = pharmacies.len(),
        "pharmacy records accumulated"
    );
    pharmacies
}
