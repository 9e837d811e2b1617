use scraper::{ElementRef, Html, Selector};
use unicode_normalization::UnicodeNormalization;

use crate::extractor::builder::PHARMACY_MARKER;
use crate::extractor::errors::ExtractError;

/// Elements whose text is never visible listing content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "svg", "iframe", "nav", "footer", "form",
    "button", "select",
];

/// Elements that start and end a line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol", "p", "pre",
    "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Containers tried, in order, before falling back to `<body>`.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    ".content",
    ".entry-content",
];

/// Locates the element holding the listing: the first content container
/// that mentions a pharmacy, else the whole body.
pub fn content_root(document: &Html) -> Result<ElementRef<'_>, ExtractError> {
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let text = element.text().collect::<String>().to_lowercase();
                if text.contains(PHARMACY_MARKER) {
                    return Ok(element);
                }
            }
        }
    }

    if let Ok(body_selector) = Selector::parse("body")
        && let Some(body) = document.select(&body_selector).next()
        && body.text().any(|text| !text.trim().is_empty())
    {
        return Ok(body);
    }

    Err(ExtractError::ContentNotFound)
}

/// Flattens an element's visible text into trimmed, non-empty lines in
/// document order, breaking at block elements, `<br>` and raw newlines.
pub fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut collector = LineCollector::default();
    collector.walk(element);
    collector.finish()
}

/// Parses a document and returns the lines of its listing container.
pub fn html_to_lines(html: &str) -> Result<Vec<String>, ExtractError> {
    let document = Html::parse_document(html);
    let root = content_root(&document)?;
    Ok(element_lines(root))
}

#[derive(Default)]
struct LineCollector {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
}

impl LineCollector {
    fn walk(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            return;
        }
        if name == "br" {
            self.break_line();
            return;
        }

        let block = BLOCK_ELEMENTS.contains(&name);
        if block {
            self.break_line();
        }
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                self.push_text(text);
            } else if let Some(child_element) = ElementRef::wrap(child) {
                self.walk(child_element);
            }
        }
        if block {
            self.break_line();
        }
    }

    fn push_text(&mut self, text: &str) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            if part.trim().is_empty() {
                self.pending_space |= !part.is_empty();
                continue;
            }
            if part.starts_with(char::is_whitespace) {
                self.pending_space = true;
            }
            for (j, word) in part.split_whitespace().enumerate() {
                if (j > 0 || self.pending_space) && !self.current.is_empty() {
                    self.current.push(' ');
                }
                self.current.push_str(word);
            }
            self.pending_space = part.ends_with(char::is_whitespace);
        }
    }

    fn break_line(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.nfc().collect());
        }
        self.current.clear();
        self.pending_space = false;
    }

    fn finish(mut self) -> Vec<String> {
        self.break_line();
        self.lines
    }
}
