pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod run;
pub mod storage;

pub use error::ScrapeError;
