//! Zone header detection and resolution.
//!
//! Resolution order matters: a known city name anywhere in the header,
//! even glued to other letters, wins over `ZONE x: name` parsing, which wins over a bare mention of
//! Lomé. Anything else becomes an ad-hoc zone keyed by its slug.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extractor::builder::is_pharmacy_name_line;
use crate::extractor::fields::{match_insurances, slugify, strip_accents, title_case};

pub const CAPITAL: &str = "Lomé";
pub const UNKNOWN_CITY: &str = "Unknown";

const MAX_HEADER_CHARS: usize = 50;

/// Cities outside the capital, keyed by their unaccented upper-case spelling.
const KNOWN_CITIES: &[(&str, &str)] = &[
    ("KARA", "Kara"),
    ("DAPAONG", "Dapaong"),
    ("SOKODE", "Sokodé"),
    ("KPALIME", "Kpalimé"),
    ("ATAKPAME", "Atakpamé"),
    ("BASSAR", "Bassar"),
    ("MANGO", "Mango"),
    ("TSEVIE", "Tsévié"),
    ("ANEHO", "Aného"),
    ("VOGAN", "Vogan"),
];

static HEADER_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ZONE\s*[A-Z0-9]+[:\s-]*.*|[A-ZÀ-Ü\s-]{4,})$").expect("invalid regex: zone header")
});

static ZONE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ZONE\s+").expect("invalid regex: zone prefix"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneHeader {
    pub zone_id: String,
    pub zone_code: String,
    pub zone_name: String,
    pub city: String,
}

/// Line-mode test for a zone boundary: a short line that is either
/// `ZONE`-prefixed or entirely upper-case letters, and is neither a
/// pharmacy line nor a bare list of insurers.
pub fn looks_like_zone_header(line: &str) -> bool {
    let line = line.trim();
    line.chars().count() < MAX_HEADER_CHARS
        && HEADER_LINE_REGEX.is_match(line)
        && !is_pharmacy_name_line(line)
        && !is_insurer_list(line)
}

fn is_insurer_list(line: &str) -> bool {
    if line.starts_with("ZONE") {
        return false;
    }
    let matched: usize = match_insurances(line)
        .iter()
        .map(|name| name.split_whitespace().count())
        .sum();
    matched > 0 && matched == line.split_whitespace().count()
}

/// Tag-mode headings announcing the interior of the country close the
/// current zone instead of opening a new one.
pub fn is_zone_reset(heading: &str) -> bool {
    let folded = strip_accents(heading).to_uppercase();
    folded.contains("INTERIEUR") || folded.contains("PAYS")
}

pub fn resolve_zone(header: &str) -> ZoneHeader {
    let collapsed = header.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = ZONE_PREFIX_REGEX
        .replace(&collapsed.to_uppercase(), "ZONE ")
        .into_owned();
    let folded = strip_accents(&text);

    if let Some((key, city)) = KNOWN_CITIES.iter().find(|(key, _)| folded.contains(*key)) {
        return ZoneHeader {
            zone_id: key.to_string(),
            zone_code: title_case(key),
            zone_name: city.to_string(),
            city: city.to_string(),
        };
    }

    if let Some(rest) = text.strip_prefix("ZONE ") {
        let (code, name) = split_zone_label(rest);
        let zone_id = code.to_string();
        return ZoneHeader {
            zone_code: format!("ZONE {zone_id}"),
            zone_name: if name.is_empty() {
                zone_id.clone()
            } else {
                name.to_string()
            },
            zone_id,
            city: CAPITAL.to_string(),
        };
    }

    if folded.contains("LOME") {
        return ZoneHeader {
            zone_id: "LOME".to_string(),
            zone_code: CAPITAL.to_string(),
            zone_name: CAPITAL.to_string(),
            city: CAPITAL.to_string(),
        };
    }

    ZoneHeader {
        zone_id: slugify(&text),
        zone_code: text.clone(),
        zone_name: title_case(&text),
        city: UNKNOWN_CITY.to_string(),
    }
}

/// Splits `A: CENTRE VILLE` into code and name, on the first colon or,
/// failing that, on a spaced dash.
fn split_zone_label(rest: &str) -> (&str, &str) {
    let split = rest
        .split_once(':')
        .or_else(|| rest.split_once(" - "));
    match split {
        Some((code, name)) => (code.trim(), name.trim()),
        None => (rest.trim(), ""),
    }
}
