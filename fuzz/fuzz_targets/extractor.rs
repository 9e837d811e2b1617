#![no_main]

use chrono::{NaiveDate, Utc};
use libfuzzer_sys::fuzz_target;

use pharmagarde::extractor::{ExtractOptions, Strategy, extract};
use pharmagarde::fetcher::decode_document;

fuzz_target!(|data: &[u8]| {
    // Charset sniffing and decoding must accept any bytes
    let page = decode_document(Some("text/html"), data);

    let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap_or_default();
    for strategy in [Strategy::Lines, Strategy::Tags] {
        let options = ExtractOptions {
            strategy,
            source_url: "https://example.com/on-call".to_string(),
            today,
            fetched_at: Utc::now(),
        };
        // The extractor should never panic regardless of input
        let _ = extract(&page.html, &options);
    }
});
