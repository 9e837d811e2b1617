use bytes::Bytes;
use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use reqwest::{StatusCode, header::HeaderMap};
use url::Url;

/// Where the charset used to decode a page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    ContentType,
    MetaCharset,
    MetaHttpEquiv,
    Detected,
}

/// A body decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct DecodedPage {
    pub html: String,
    pub encoding: &'static Encoding,
    pub source: CharsetSource,
    /// Some bytes were not valid in `encoding` and were replaced.
    pub lossy: bool,
}

impl DecodedPage {
    pub fn charset(&self) -> &'static str {
        self.encoding.name()
    }
}

#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_raw: Bytes,
    pub page: DecodedPage,
    pub fetched_at: DateTime<Utc>,
}

impl PageResponse {
    pub fn html(&self) -> &str {
        &self.page.html
    }
}
