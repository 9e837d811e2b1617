use std::sync::LazyLock;

use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::{StatusCode, header::HeaderMap};
use tracing::{debug, warn};
use url::Url;

use crate::fetcher::types::{CharsetSource, DecodedPage, PageResponse};

const SNIFF_LEN: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).expect("invalid regex: charset")
});

static META_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#)
        .expect("invalid regex: meta charset")
});

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#)
        .expect("invalid regex: meta http-equiv")
});

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    headers: HeaderMap,
    body_bytes: Bytes,
    content_type: &str,
) -> PageResponse {
    let page = decode_document(Some(content_type), &body_bytes);

    PageResponse {
        url_final,
        status,
        headers,
        body_raw: body_bytes,
        page,
        fetched_at: Utc::now(),
    }
}

/// Decodes an HTML body to UTF-8.
///
/// The charset comes from the `Content-Type` header, then `<meta charset>`,
/// then `<meta http-equiv>`, and finally a statistical guess. Invalid
/// sequences are replaced rather than rejected.
pub fn decode_document(content_type: Option<&str>, body_bytes: &[u8]) -> DecodedPage {
    let (encoding, source) = detect_charset(content_type, body_bytes);
    let (decoded, encoding, lossy) = encoding.decode(body_bytes);

    if lossy {
        warn!(
            charset = encoding.name(),
            "page contains bytes invalid in its charset, replaced"
        );
    }
    debug!(charset = encoding.name(), ?source, "page decoded");

    DecodedPage {
        html: decoded.into_owned(),
        encoding,
        source,
        lossy,
    }
}

fn detect_charset(
    content_type: Option<&str>,
    body_bytes: &[u8],
) -> (&'static Encoding, CharsetSource) {
    if let Some(encoding) = content_type.and_then(|ct| label_from(&CHARSET_REGEX, ct)) {
        return (encoding, CharsetSource::ContentType);
    }

    let search_bytes = &body_bytes[..body_bytes.len().min(SNIFF_LEN)];
    let search_str = String::from_utf8_lossy(search_bytes);

    let declared = [
        (&*META_CHARSET_REGEX, CharsetSource::MetaCharset),
        (&*META_HTTP_EQUIV_REGEX, CharsetSource::MetaHttpEquiv),
    ];
    for (regex, source) in declared {
        if let Some(encoding) = label_from(regex, &search_str) {
            return (encoding, source);
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, body_bytes.len() <= SNIFF_LEN);
    (detector.guess(None, true), CharsetSource::Detected)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}
