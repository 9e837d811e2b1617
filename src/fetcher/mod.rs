pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use client::HttpFetcher;
pub use errors::FetchError;
pub use pipeline::decode_document;
pub use types::{DecodedPage, PageResponse};
