use thiserror::Error;

use crate::config::ConfigError;
use crate::extractor::ExtractError;
use crate::fetcher::FetchError;
use crate::storage::StorageError;

/// Every way a run can fail. All of them end the run with exit code 1.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// A structural failure usually means the source page changed layout.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Extract(_))
    }
}
