//! Detection strategies turning a listing container into [`Segment`]s.
//!
//! The same page has been published both as loose text lines and as
//! heading/paragraph markup, so two strategies share one interface and
//! feed the same record builder.

use scraper::{ElementRef, Selector};

use crate::extractor::builder::{PHARMACY_MARKER, is_pharmacy_name_line, split_name_line};
use crate::extractor::fields::strip_accents;
use crate::extractor::normalizer::element_lines;
use crate::extractor::zones::{ZoneHeader, is_zone_reset, looks_like_zone_header, resolve_zone};

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const TAG_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, td";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Opens a new zone.
    Zone(ZoneHeader),
    /// Leaves the current zone without opening another.
    ZoneReset,
    /// Opens a new pharmacy; `rest` is whatever followed the name on the same line.
    Pharmacy { name: String, rest: Option<String> },
    /// Any other text line.
    Field(String),
}

pub trait Segmenter {
    fn name(&self) -> &'static str;

    fn segments(&self, root: ElementRef<'_>) -> Vec<Segment>;
}

/// Classifies normalized text lines one by one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSegmenter;

impl LineSegmenter {
    pub fn segment_lines<S: AsRef<str>>(lines: &[S]) -> Vec<Segment> {
        lines
            .iter()
            .filter_map(|line| classify_line(line.as_ref()))
            .collect()
    }
}

impl Segmenter for LineSegmenter {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn segments(&self, root: ElementRef<'_>) -> Vec<Segment> {
        Self::segment_lines(&element_lines(root))
    }
}

/// Line-mode classification. The week declaration yields nothing.
pub fn classify_line(line: &str) -> Option<Segment> {
    let line = line.trim();
    if line.is_empty() || is_week_line(line) {
        return None;
    }
    if is_pharmacy_name_line(line) {
        let (name, rest) = split_name_line(line);
        return Some(Segment::Pharmacy { name, rest });
    }
    if looks_like_zone_header(line) {
        return Some(Segment::Zone(resolve_zone(line)));
    }
    Some(Segment::Field(line.to_string()))
}

fn is_week_line(line: &str) -> bool {
    strip_accents(line).to_uppercase().contains("SEMAINE DU")
}

/// Reads structure from the markup: headings are zones, paragraphs, list
/// items and table cells holding a pharmacy name open records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagSegmenter;

impl Segmenter for TagSegmenter {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn segments(&self, root: ElementRef<'_>) -> Vec<Segment> {
        let Ok(selector) = Selector::parse(TAG_SELECTOR) else {
            return Vec::new();
        };

        let mut segments = Vec::new();
        for element in root.select(&selector) {
            let name = element.value().name();
            if matches!(name, "li" | "td") && contains_paragraph(element) {
                // the nested paragraphs are visited on their own
                continue;
            }

            let lines = element_lines(element);
            if lines.is_empty() {
                continue;
            }

            if HEADINGS.contains(&name) {
                segments.extend(heading_segment(&lines.join(" ")));
            } else {
                block_segments(&lines, &mut segments);
            }
        }
        segments
    }
}

fn heading_segment(text: &str) -> Option<Segment> {
    if is_week_line(text) {
        return None;
    }
    if is_zone_reset(text) {
        return Some(Segment::ZoneReset);
    }
    Some(Segment::Zone(resolve_zone(text)))
}

/// A paragraph is a pharmacy when it names one: either it starts with the
/// marker, or it mentions the marker and carries a `name: details` colon.
fn block_segments(lines: &[String], segments: &mut Vec<Segment>) {
    let joined = lines.join(" ");
    let mentions_marker = joined.to_lowercase().contains(PHARMACY_MARKER);
    let name_index = if is_pharmacy_name_line(&lines[0]) {
        Some(0)
    } else if mentions_marker && joined.contains(':') {
        lines
            .iter()
            .position(|line| line.to_lowercase().contains(PHARMACY_MARKER))
    } else {
        None
    };

    for (i, line) in lines.iter().enumerate() {
        if is_week_line(line) {
            continue;
        }
        if Some(i) == name_index {
            let (name, rest) = split_name_line(from_marker(line));
            segments.push(Segment::Pharmacy { name, rest });
        } else {
            segments.push(Segment::Field(line.clone()));
        }
    }
}

/// The part of the line starting at the pharmacy marker.
fn from_marker(line: &str) -> &str {
    line.char_indices()
        .find(|(i, _)| {
            line.get(*i..*i + PHARMACY_MARKER.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(PHARMACY_MARKER))
        })
        .map_or(line, |(i, _)| &line[i..])
}

fn contains_paragraph(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|child| child.value().name() == "p")
}
