//! Folds a stream of [`Segment`]s into raw pharmacy records.
//!
//! The scan is an explicit state machine: each segment moves the builder
//! to a new state and may close the record that was being accumulated.
//! Field lines carry no fixed order, so each one is classified by its
//! content (phone, insurers, or address text) and merged into the open
//! record.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extractor::fields::{
    clean_address_fragment, find_phones, first_phone_offset, is_upper_text, match_insurances,
    mentions_insurance,
};
use crate::extractor::segment::Segment;
use crate::extractor::zones::ZoneHeader;

pub const PHARMACY_MARKER: &str = "pharmacie";

/// Labels that start a field, and so end the name, on a pharmacy line.
static FIELD_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:t[ée]l[ée]phone|t[ée]l|cel|adresse|assurances?)\b")
        .expect("invalid regex: field label")
});

/// A pharmacy as accumulated from the page, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPharmacy {
    pub zone: Option<ZoneHeader>,
    pub name: String,
    pub address: String,
    pub phones: Vec<String>,
    pub insurances: Vec<String>,
}

impl RawPharmacy {
    fn open(zone: Option<ZoneHeader>, name: String) -> Self {
        Self {
            zone,
            name,
            ..Self::default()
        }
    }

    /// Merges one field line into the record.
    pub fn fold_field(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let phones = find_phones(line);
        if !phones.is_empty() {
            self.phones.extend(phones);
            return;
        }

        // upper-case lines are insurer lists; unmatched ones are noise
        if mentions_insurance(line) || is_upper_text(line) {
            self.insurances.extend(match_insurances(line));
            self.insurances.sort();
            self.insurances.dedup();
            return;
        }

        let fragment = clean_address_fragment(line);
        if fragment.is_empty() {
            return;
        }
        if !self.address.is_empty() {
            self.address.push(' ');
        }
        self.address.push_str(&fragment);
    }

    /// Folds the text that followed the name on the same line, which
    /// packs several fields separated by commas or semicolons.
    fn fold_inline(&mut self, rest: &str) {
        for fragment in rest.split([',', ';']) {
            self.fold_field(fragment);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BuilderState {
    #[default]
    NoZone,
    InZone(ZoneHeader),
    Accumulating(RawPharmacy),
}

impl BuilderState {
    fn zone(&self) -> Option<&ZoneHeader> {
        match self {
            Self::NoZone => None,
            Self::InZone(zone) => Some(zone),
            Self::Accumulating(pharmacy) => pharmacy.zone.as_ref(),
        }
    }

    /// Closes the open record, if any.
    pub fn finish(self) -> Option<RawPharmacy> {
        match self {
            Self::Accumulating(pharmacy) if !pharmacy.name.is_empty() => Some(pharmacy),
            _ => None,
        }
    }

    /// Applies one segment, returning the next state and the record the
    /// segment closed.
    pub fn step(self, segment: Segment) -> (Self, Option<RawPharmacy>) {
        match segment {
            Segment::Zone(header) => (Self::InZone(header), self.finish()),
            Segment::ZoneReset => (Self::NoZone, self.finish()),
            Segment::Pharmacy { name, rest } => {
                if name.is_empty() {
                    return (self, None);
                }
                let mut pharmacy = RawPharmacy::open(self.zone().cloned(), name);
                if let Some(rest) = rest {
                    pharmacy.fold_inline(&rest);
                }
                (Self::Accumulating(pharmacy), self.finish())
            }
            Segment::Field(line) => match self {
                Self::Accumulating(mut pharmacy) => {
                    pharmacy.fold_field(&line);
                    (Self::Accumulating(pharmacy), None)
                }
                idle => {
                    debug!(line = %line, "field line outside any pharmacy ignored");
                    (idle, None)
                }
            },
        }
    }
}

/// Runs the whole segment stream through the state machine.
pub fn build_pharmacies(segments: impl IntoIterator<Item = Segment>) -> Vec<RawPharmacy> {
    let mut pharmacies = Vec::new();
    let mut state = BuilderState::default();

    for segment in segments {
        let (next, emitted) = state.step(segment);
        pharmacies.extend(emitted);
        state = next;
    }
    pharmacies.extend(state.finish());

    pharmacies
}

/// True when the line opens a new pharmacy (`Pharmacie …`, any case).
pub fn is_pharmacy_name_line(line: &str) -> bool {
    let cleaned = strip_heading_marks(line);
    cleaned
        .get(..PHARMACY_MARKER.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(PHARMACY_MARKER))
        && cleaned[PHARMACY_MARKER.len()..].starts_with(char::is_whitespace)
}

/// Splits `Pharmacie Centrale: Rue du Commerce` into the cleaned name and
/// the inline remainder.
///
/// The name ends at the first colon, unless a field label or a phone
/// number comes earlier, in which case the remainder starts with it.
pub fn split_name_line(line: &str) -> (String, Option<String>) {
    let cleaned = strip_heading_marks(line);
    let field_start = [
        FIELD_LABEL_REGEX.find(cleaned).map(|m| m.start()),
        first_phone_offset(cleaned),
    ]
    .into_iter()
    .flatten()
    .filter(|&offset| offset > 0)
    .min();

    let (name, rest) = match (cleaned.find(':'), field_start) {
        (Some(colon), Some(start)) if start < colon => cleaned.split_at(start),
        (Some(colon), _) => (&cleaned[..colon], &cleaned[colon + 1..]),
        (None, Some(start)) => cleaned.split_at(start),
        (None, None) => (cleaned, ""),
    };

    let rest = rest.trim();
    (
        clean_name(name),
        (!rest.is_empty()).then(|| rest.to_string()),
    )
}

fn strip_heading_marks(line: &str) -> &str {
    line.trim().trim_start_matches('#').trim_start()
}

fn clean_name(name: &str) -> String {
    name.trim()
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | ':'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
