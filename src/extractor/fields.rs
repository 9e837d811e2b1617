//! Per-value normalizers applied to extracted pharmacy fields.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub const COUNTRY_PREFIX: &str = "228";
pub const ADDRESS_UNAVAILABLE: &str = "Adresse non disponible";

/// Insurers accepted by on-duty pharmacies, as printed by the source.
const KNOWN_INSURERS: &[&str] = &[
    "AMU",
    "CNSS",
    "INAM",
    "SANLAM",
    "GRAS SAVOYE",
    "GTA-C2A",
    "GTA-C2",
    "AGCA",
    "SUNU",
    "TRANSVIE",
    "FIDELIA ASSURANCE",
    "FIDELIA",
    "LA CITOYENNE",
    "OLEA",
    "NSIA",
    "MSH",
    "ASCOMA",
    "LORICA",
];

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+228[\s.\-]*|\b228[\s.\-]*|\b)(?:\d{2}[\s.\-]*){3}\d{2}\b")
        .expect("invalid regex: phone")
});

static INSURER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let mut names: Vec<&str> = KNOWN_INSURERS.to_vec();
    // longest first so GTA-C2A wins over GTA-C2
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("invalid regex: insurers")
});

static INSURANCE_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*ASSURANCES?\b\s*:?|\bASSURANCES?\s*:").expect("invalid regex: insurance label")
});

static INSURANCE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/,;]+").expect("invalid regex: insurance separators"));

static ADDRESS_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:adresse|addr\.?|situ[ée]e?)\s*:\s*").expect("invalid regex: address label")
});

static NON_ALNUM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("invalid regex: non alnum"));

/// Both renderings of a phone number.
///
/// When the input is not a recognizable Togolese number, `compact` and
/// `formatted` both carry the original text and `recognized` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phone {
    pub compact: String,
    pub formatted: String,
    pub recognized: bool,
}

impl Phone {
    fn passthrough(raw: &str) -> Self {
        Self {
            compact: raw.to_string(),
            formatted: raw.to_string(),
            recognized: false,
        }
    }
}

pub fn normalize_phone(raw: &str) -> Phone {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    let national = match digits.strip_prefix(COUNTRY_PREFIX) {
        Some(rest) if digits.len() == 11 => rest,
        _ => digits.as_str(),
    };

    if national.len() != 8 {
        return Phone::passthrough(raw);
    }

    Phone {
        compact: format!("+{COUNTRY_PREFIX}{national}"),
        formatted: format!(
            "+{COUNTRY_PREFIX} {} {} {} {}",
            &national[0..2],
            &national[2..4],
            &national[4..6],
            &national[6..8]
        ),
        recognized: true,
    }
}

/// Phone-number candidates found in a line, in order, trimmed but otherwise raw.
pub fn find_phones(text: &str) -> Vec<String> {
    PHONE_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim().trim_end_matches(['.', '-']).to_string())
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

/// Byte offset of the first phone-number candidate in the line.
pub fn first_phone_offset(text: &str) -> Option<usize> {
    PHONE_REGEX.find(text).map(|m| m.start())
}

/// Collapses the raw numbers gathered for one pharmacy into the
/// `(phone, phone_formatted)` pair of the output record.
///
/// The primary phone is the first recognized number (or the first raw
/// candidate if none is recognized); the formatted field lists every
/// distinct number separated by `" / "`.
pub fn summarize_phones(raw_numbers: &[String]) -> (String, String) {
    let mut seen = BTreeSet::new();
    let phones: Vec<Phone> = raw_numbers
        .iter()
        .map(|raw| normalize_phone(raw))
        .filter(|phone| seen.insert(phone.compact.clone()))
        .collect();

    let primary = phones
        .iter()
        .find(|phone| phone.recognized)
        .or_else(|| phones.first())
        .map(|phone| phone.compact.clone())
        .unwrap_or_default();

    let formatted = phones
        .iter()
        .map(|phone| phone.formatted.as_str())
        .collect::<Vec<_>>()
        .join(" / ");

    (primary, formatted)
}

/// Matches free text against the insurer vocabulary.
///
/// Results are title-cased, de-duplicated and sorted.
pub fn match_insurances(text: &str) -> Vec<String> {
    let upper = text.to_uppercase();
    let unlabelled = INSURANCE_LABEL_REGEX.replace_all(&upper, " ");
    let spaced = INSURANCE_SEPARATORS.replace_all(&unlabelled, " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    INSURER_REGEX
        .find_iter(&collapsed)
        .map(|m| title_case(m.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn mentions_insurance(text: &str) -> bool {
    strip_accents(text).to_lowercase().contains("assurance")
}

/// ASCII, lowercase, underscore-delimited identifier.
pub fn slugify(text: &str) -> String {
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();
    NON_ALNUM_REGEX
        .replace_all(&ascii.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// Removes diacritics but keeps every base character.
pub fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest,
/// so `"PHARMACIE DE L'OCEAN"` becomes `"Pharmacie De L'Ocean"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// True when the text has at least one cased letter and no lowercase ones.
pub fn is_upper_text(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

pub fn is_open_24h(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("24h") || lower.contains("24/7")
}

pub fn clean_address_fragment(text: &str) -> String {
    ADDRESS_LABEL_REGEX
        .replace(text.trim(), "")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '-'))
        .to_string()
}
