//! Sentence segmentation for sentence-indexed locators

use regex_lite::Regex;
use std::ops::Range;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Words whose trailing period does not end a sentence
///
/// `etc.` is left out: it ends sentences about as often as it continues them.
static ABBREVIATION: OnceLock<Option<Regex>> = OnceLock::new();

/// A single capital letter followed by a period (`J. Smith`)
static INITIAL: OnceLock<Option<Regex>> = OnceLock::new();

fn abbreviation() -> Option<&'static Regex> {
    ABBREVIATION
        .get_or_init(|| {
            Regex::new(
                r#"(?i)(?:^|[\s(\["'])(?:mr|mrs|ms|dr|prof|sr|jr|st|mt|vs|fig|figs|no|nos|vol|pp|cf|al|approx|dept|est|inc|ltd|co|corp|jan|feb|mar|apr|jun|jul|aug|sep|sept|oct|nov|dec|e\.g|i\.e)\.$"#,
            )
            .ok()
        })
        .as_ref()
}

fn initial() -> Option<&'static Regex> {
    INITIAL
        .get_or_init(|| Regex::new(r"(?:^|\s)[A-Z]\.$").ok())
        .as_ref()
}

fn ends_with_abbreviation(text: &str) -> bool {
    let text = text.trim_end();
    abbreviation().map(|re| re.is_match(text)).unwrap_or(false)
        || initial().map(|re| re.is_match(text)).unwrap_or(false)
}

/// Sentence spans of a paragraph text, as char offset ranges
///
/// Spans exclude surrounding whitespace; whitespace-only pieces produce no span.
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut byte_spans: Vec<Range<usize>> = Vec::new();
    let mut pending: Option<Range<usize>> = None;

    for (start, piece) in text.split_sentence_bound_indices() {
        let end = start + piece.len();
        let span = match pending.take() {
            Some(open) => open.start..end,
            None => start..end,
        };
        if ends_with_abbreviation(&text[span.clone()]) {
            pending = Some(span);
        } else {
            byte_spans.push(span);
        }
    }
    if let Some(open) = pending {
        byte_spans.push(open);
    }

    byte_spans
        .into_iter()
        .filter_map(|span| {
            let slice = &text[span.clone()];
            let lead = slice.len() - slice.trim_start().len();
            let trimmed = slice.trim();
            if trimmed.is_empty() {
                return None;
            }
            let start = span.start + lead;
            let end = start + trimmed.len();
            Some(char_offset(text, start)..char_offset(text, end))
        })
        .collect()
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}
