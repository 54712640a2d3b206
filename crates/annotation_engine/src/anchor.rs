//! Anchor resolution
//!
//! Text locators are resolved by a fixed ladder of strategies, each looser
//! than the one before. The first strategy producing at least the requested
//! number of occurrences wins. When every strategy fails the resolver ranks
//! paragraphs that look similar to the search text as closest matches.

use crate::normalize::{find_all, Folded};
use crate::text_view::{LogicalTextView, ParagraphView, TextPosition};
use crate::{AnnotationError, EngineConfig, Locator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Strategy that produced a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    Exact,
    Normalized,
    Dehyphenated,
    CaseInsensitive,
    CrossParagraph,
    Position,
}

/// The span an annotation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    pub start: TextPosition,
    /// Exclusive end
    pub end: TextPosition,
    /// Source text of the span, paragraphs separated by newlines
    pub matched: String,
    pub strategy: MatchStrategy,
}

impl ResolvedSpan {
    pub fn is_empty(&self) -> bool {
        self.start.paragraph == self.end.paragraph && self.start.offset == self.end.offset
    }

    pub fn paragraphs(&self) -> std::ops::RangeInclusive<usize> {
        self.start.paragraph..=self.end.paragraph
    }
}

/// A paragraph resembling a search text that was not found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosestMatch {
    pub paragraph_index: usize,
    /// The paragraph text around the fragment
    pub snippet: String,
    /// Longest stretch of the search text found in the paragraph
    pub fragment: String,
}

/// Why a locator did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFailure {
    pub error: AnnotationError,
    pub closest_matches: Vec<ClosestMatch>,
}

impl From<AnnotationError> for ResolveFailure {
    fn from(error: AnnotationError) -> Self {
        Self {
            error,
            closest_matches: Vec::new(),
        }
    }
}

/// A match in paragraph coordinates, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Hit {
    start: (usize, usize),
    end: (usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    Normalized,
    Dehyphenated,
    CaseInsensitive,
}

impl Fold {
    const LADDER: [Fold; 3] = [Fold::Normalized, Fold::Dehyphenated, Fold::CaseInsensitive];

    fn strategy(self) -> MatchStrategy {
        match self {
            Fold::Normalized => MatchStrategy::Normalized,
            Fold::Dehyphenated => MatchStrategy::Dehyphenated,
            Fold::CaseInsensitive => MatchStrategy::CaseInsensitive,
        }
    }

    fn haystack(self, text: &str) -> Folded {
        let normalized = Folded::normalize(text);
        match self {
            Fold::Normalized => normalized,
            Fold::Dehyphenated => normalized.dehyphenate(),
            Fold::CaseInsensitive => normalized.dehyphenate().lowercase(),
        }
    }

    fn needle(self, find: &str) -> Folded {
        let needle = Folded::needle(find);
        match self {
            Fold::CaseInsensitive => needle.lowercase(),
            _ => needle,
        }
    }
}

/// Resolves locators against one snapshot of the logical text
pub struct AnchorResolver<'a> {
    view: &'a LogicalTextView,
    config: &'a EngineConfig,
}

impl<'a> AnchorResolver<'a> {
    pub fn new(view: &'a LogicalTextView, config: &'a EngineConfig) -> Self {
        Self { view, config }
    }

    pub fn resolve(&self, locator: &Locator) -> Result<ResolvedSpan, ResolveFailure> {
        match locator {
            Locator::Position {
                paragraph,
                sentence,
            } => self.resolve_position(*paragraph, *sentence).map_err(Into::into),
            Locator::Text {
                find,
                occurrence,
                paragraph_hint,
            } => self.resolve_text(find, *occurrence, *paragraph_hint),
        }
    }

    fn resolve_position(
        &self,
        paragraph: usize,
        sentence: Option<usize>,
    ) -> Result<ResolvedSpan, AnnotationError> {
        let count = self.view.paragraph_count();
        let view = self
            .view
            .paragraph(paragraph)
            .ok_or(AnnotationError::ParagraphOutOfRange {
                index: paragraph,
                count,
            })?;
        let range = match sentence {
            None => 0..view.len(),
            Some(index) => view.sentences.get(index).cloned().ok_or(
                AnnotationError::SentenceOutOfRange {
                    paragraph,
                    index,
                    count: view.sentences.len(),
                },
            )?,
        };
        self.span(
            Hit {
                start: (paragraph, range.start),
                end: (paragraph, range.end),
            },
            MatchStrategy::Position,
        )
    }

    fn resolve_text(
        &self,
        find: &str,
        occurrence: usize,
        hint: Option<usize>,
    ) -> Result<ResolvedSpan, ResolveFailure> {
        if find.trim().is_empty() {
            return Err(AnnotationError::Malformed("find must not be empty".into()).into());
        }
        if occurrence == 0 {
            return Err(AnnotationError::Malformed("occurrence is 1-based".into()).into());
        }
        if let Some(index) = hint {
            if index >= self.view.paragraph_count() {
                return Err(AnnotationError::ParagraphOutOfRange {
                    index,
                    count: self.view.paragraph_count(),
                }
                .into());
            }
        }

        let mut best_found = 0;
        let ladder = std::iter::once((MatchStrategy::Exact, None))
            .chain(Fold::LADDER.iter().map(|f| (f.strategy(), Some(*f))))
            .map(|(strategy, fold)| (strategy, self.paragraph_hits(find, fold)))
            .chain(std::iter::once_with(|| {
                (MatchStrategy::CrossParagraph, self.cross_paragraph_hits(find, occurrence, hint))
            }));

        for (strategy, hits) in ladder {
            let hits: Vec<Hit> = hits
                .into_iter()
                .filter(|h| hint.map_or(true, |p| h.start.0 == p))
                .collect();
            best_found = best_found.max(hits.len());
            if let Some(hit) = hits.get(occurrence - 1) {
                tracing::debug!(?strategy, find, occurrence, "Resolved text locator");
                return self.span(*hit, strategy).map_err(Into::into);
            }
        }

        let error = if best_found > 0 {
            AnnotationError::InsufficientOccurrences {
                find: find.to_string(),
                requested: occurrence,
                found: best_found,
            }
        } else {
            AnnotationError::TextNotFound {
                find: find.to_string(),
            }
        };
        Err(ResolveFailure {
            error,
            closest_matches: self.closest_matches(find),
        })
    }

    /// Matches inside single paragraphs, in document order
    fn paragraph_hits(&self, find: &str, fold: Option<Fold>) -> Vec<Hit> {
        let mut hits = Vec::new();
        for (index, para) in self.view.paragraphs().iter().enumerate() {
            if para.is_empty() {
                continue;
            }
            let (haystack, needle) = match fold {
                None => (Folded::identity(&para.text), Folded::identity(find)),
                Some(fold) => (fold.haystack(&para.text), fold.needle(find)),
            };
            for at in find_all(&haystack.chars, &needle.chars) {
                let range = haystack.source_range(at, at + needle.len());
                hits.push(Hit {
                    start: (index, range.start),
                    end: (index, range.end),
                });
            }
        }
        hits
    }

    /// Matches over windows of consecutive non-empty paragraphs that actually
    /// cross a paragraph boundary
    ///
    /// The folding ladder is retried inside this level; the first fold with
    /// enough crossing matches wins, otherwise the fold with the most matches
    /// is reported.
    fn cross_paragraph_hits(&self, find: &str, occurrence: usize, hint: Option<usize>) -> Vec<Hit> {
        let window = self.config.cross_paragraph_window.max(2);
        let filled: Vec<usize> = self
            .view
            .paragraphs()
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty())
            .map(|(i, _)| i)
            .collect();
        if filled.len() < 2 {
            return Vec::new();
        }

        let mut best: Vec<Hit> = Vec::new();
        for fold in Fold::LADDER {
            let needle = fold.needle(find);
            let mut seen = HashSet::new();
            let mut hits = Vec::new();
            for first in 0..filled.len() - 1 {
                let members = &filled[first..(first + window).min(filled.len())];
                let joined = JoinedWindow::new(self.view, members);
                let haystack = fold.haystack(&joined.text);
                for at in find_all(&haystack.chars, &needle.chars) {
                    let range = haystack.source_range(at, at + needle.len());
                    let hit = Hit {
                        start: joined.locate(range.start),
                        end: joined.locate_end(range.end),
                    };
                    if hit.start.0 != hit.end.0 && seen.insert(hit) {
                        hits.push(hit);
                    }
                }
            }
            hits.sort();
            let mut kept: Vec<Hit> = Vec::with_capacity(hits.len());
            for hit in hits {
                if kept.last().map_or(true, |last| hit.start >= last.end) {
                    kept.push(hit);
                }
            }
            let counted = kept
                .iter()
                .filter(|h| hint.map_or(true, |p| h.start.0 == p))
                .count();
            if counted >= occurrence {
                return kept;
            }
            let best_counted = best
                .iter()
                .filter(|h| hint.map_or(true, |p| h.start.0 == p))
                .count();
            if counted > best_counted {
                best = kept;
            }
        }
        best
    }

    fn span(&self, hit: Hit, strategy: MatchStrategy) -> Result<ResolvedSpan, AnnotationError> {
        let count = self.view.paragraph_count();
        let start = self
            .view
            .position(hit.start.0, hit.start.1)
            .ok_or(AnnotationError::ParagraphOutOfRange {
                index: hit.start.0,
                count,
            })?;
        let end = self
            .view
            .end_position(hit.end.0, hit.end.1)
            .ok_or(AnnotationError::ParagraphOutOfRange {
                index: hit.end.0,
                count,
            })?;
        Ok(ResolvedSpan {
            start,
            end,
            matched: self.view.text_between(hit.start, hit.end),
            strategy,
        })
    }

    /// Paragraphs ranked by longest common fragment and token overlap
    fn closest_matches(&self, find: &str) -> Vec<ClosestMatch> {
        let needle = Fold::CaseInsensitive.needle(find);
        if needle.is_empty() {
            return Vec::new();
        }
        let needle_tokens = tokens(&needle.chars);
        let threshold = self.config.min_fragment_length.min(needle.len()).max(1);

        let mut scored: Vec<(f64, usize, ClosestMatch)> = Vec::new();
        for (index, para) in self.view.paragraphs().iter().enumerate() {
            if para.is_empty() {
                continue;
            }
            let haystack = Fold::CaseInsensitive.haystack(&para.text);
            let (at, len) = longest_common_substring(&haystack.chars, &needle.chars);
            if len < threshold {
                continue;
            }
            let para_tokens = tokens(&haystack.chars);
            let overlap = if needle_tokens.is_empty() {
                0.0
            } else {
                needle_tokens.iter().filter(|t| para_tokens.contains(*t)).count() as f64
                    / needle_tokens.len() as f64
            };
            let score = 0.5 * (len as f64 / needle.len() as f64) + 0.5 * overlap;
            let range = haystack.source_range(at, at + len);
            scored.push((
                score,
                index,
                ClosestMatch {
                    paragraph_index: index,
                    snippet: snippet(para, range.start, range.end, self.config.snippet_radius),
                    fragment: para.slice(range.start, range.end),
                },
            ));
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.config.max_closest_matches)
            .map(|(_, _, m)| m)
            .collect()
    }
}

/// Several paragraphs joined with line breaks, with a map back to paragraph
/// coordinates
struct JoinedWindow {
    text: String,
    /// (paragraph index, char offset of its first char in `text`, length)
    segments: Vec<(usize, usize, usize)>,
}

impl JoinedWindow {
    fn new(view: &LogicalTextView, members: &[usize]) -> Self {
        let mut text = String::new();
        let mut segments = Vec::with_capacity(members.len());
        let mut at = 0;
        for (i, index) in members.iter().enumerate() {
            if i > 0 {
                text.push('\n');
                at += 1;
            }
            let Some(para) = view.paragraph(*index) else { continue };
            text.push_str(&para.text);
            segments.push((*index, at, para.len()));
            at += para.len();
        }
        Self { text, segments }
    }

    /// Paragraph coordinates of the char at `offset`
    fn locate(&self, offset: usize) -> (usize, usize) {
        for (index, start, len) in &self.segments {
            if offset < start + len {
                return (*index, offset.saturating_sub(*start));
            }
        }
        self.segments
            .last()
            .map(|(index, _, len)| (*index, *len))
            .unwrap_or((0, 0))
    }

    /// Paragraph coordinates of an exclusive end offset
    fn locate_end(&self, end: usize) -> (usize, usize) {
        let (index, offset) = self.locate(end.saturating_sub(1));
        (index, offset + 1)
    }
}

fn tokens(chars: &[char]) -> HashSet<String> {
    chars
        .split(|c| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.iter().collect())
        .collect()
}

/// Start in `haystack` and length of the longest common substring
fn longest_common_substring(haystack: &[char], needle: &[char]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut previous = vec![0usize; needle.len() + 1];
    let mut current = vec![0usize; needle.len() + 1];
    for (i, h) in haystack.iter().enumerate() {
        for (j, n) in needle.iter().enumerate() {
            current[j + 1] = if h == n { previous[j] + 1 } else { 0 };
            if current[j + 1] > best.1 {
                best = (i + 1 - current[j + 1], current[j + 1]);
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}

fn snippet(para: &ParagraphView, start: usize, end: usize, radius: usize) -> String {
    let from = start.saturating_sub(radius);
    let to = (end + radius).min(para.len());
    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.push_str(&para.slice(from, to));
    if to < para.len() {
        out.push_str("...");
    }
    out
}
