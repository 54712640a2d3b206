//! Logical text view
//!
//! A read-only projection of the document: one string per paragraph built
//! from its anchorable runs, the run boundaries inside it and its sentence
//! spans. The view holds indices only; it is rebuilt from the document before
//! every resolution.

use crate::sentence::sentence_spans;
use doc_model::{Document, Inline};
use std::ops::Range;

/// An anchorable run's place in its paragraph text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSlice {
    /// Index of the run among the paragraph's inline items
    pub inline: usize,
    /// Char offset of the run's first character
    pub start: usize,
    pub len: usize,
}

/// Logical text of one paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphView {
    pub text: String,
    pub runs: Vec<RunSlice>,
    pub sentences: Vec<Range<usize>>,
    len: usize,
}

impl ParagraphView {
    /// Length in chars
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Text of the char range `[start, end)`
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// The run holding the char at `offset`, and the offset inside it
    pub fn run_at(&self, offset: usize) -> Option<(usize, usize)> {
        self.runs
            .iter()
            .find(|r| offset >= r.start && offset < r.start + r.len)
            .map(|r| (r.inline, offset - r.start))
    }
}

/// A character position resolved down to its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub paragraph: usize,
    /// Char offset in the paragraph text
    pub offset: usize,
    /// Inline index of the run, `None` in a paragraph without text
    pub run: Option<usize>,
    pub run_offset: usize,
}

/// Paragraph-indexed logical text of a whole document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalTextView {
    paragraphs: Vec<ParagraphView>,
}

impl LogicalTextView {
    pub fn extract(document: &Document) -> Self {
        let paragraphs = document
            .paragraphs
            .iter()
            .map(|para| {
                let mut text = String::new();
                let mut runs = Vec::new();
                let mut len = 0;
                for (inline, item) in para.inlines.iter().enumerate() {
                    let Inline::Run(run) = item else { continue };
                    let run_len = run.anchor_len();
                    if run_len == 0 {
                        continue;
                    }
                    text.push_str(run.content.logical_text());
                    runs.push(RunSlice {
                        inline,
                        start: len,
                        len: run_len,
                    });
                    len += run_len;
                }
                let sentences = sentence_spans(&text);
                ParagraphView {
                    text,
                    runs,
                    sentences,
                    len,
                }
            })
            .collect();
        Self { paragraphs }
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraph(&self, index: usize) -> Option<&ParagraphView> {
        self.paragraphs.get(index)
    }

    pub fn paragraphs(&self) -> &[ParagraphView] {
        &self.paragraphs
    }

    /// All paragraph texts joined with newlines
    pub fn global_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Offset in the global text of a paragraph-relative offset
    pub fn global_offset(&self, paragraph: usize, offset: usize) -> usize {
        self.paragraphs[..paragraph.min(self.paragraphs.len())]
            .iter()
            .map(|p| p.len + 1)
            .sum::<usize>()
            + offset
    }

    /// Position of the character at `offset`, or of the text end when
    /// `offset` equals the paragraph length
    pub fn position(&self, paragraph: usize, offset: usize) -> Option<TextPosition> {
        let view = self.paragraphs.get(paragraph)?;
        if offset > view.len {
            return None;
        }
        let (run, run_offset) = match view.run_at(offset) {
            Some((run, within)) => (Some(run), within),
            None => match view.runs.last() {
                Some(last) => (Some(last.inline), last.len),
                None => (None, 0),
            },
        };
        Some(TextPosition {
            paragraph,
            offset,
            run,
            run_offset,
        })
    }

    /// Position just past the character before `end`
    pub fn end_position(&self, paragraph: usize, end: usize) -> Option<TextPosition> {
        let view = self.paragraphs.get(paragraph)?;
        if end > view.len {
            return None;
        }
        if end == 0 {
            return self.position(paragraph, 0);
        }
        let (run, within) = view.run_at(end - 1)?;
        Some(TextPosition {
            paragraph,
            offset: end,
            run: Some(run),
            run_offset: within + 1,
        })
    }

    /// Text between two positions, paragraphs separated by newlines
    pub fn text_between(&self, start: (usize, usize), end: (usize, usize)) -> String {
        let (sp, so) = start;
        let (ep, eo) = end;
        if sp == ep {
            return self
                .paragraphs
                .get(sp)
                .map(|p| p.slice(so, eo))
                .unwrap_or_default();
        }
        let mut parts = Vec::new();
        for index in sp..=ep.min(self.paragraphs.len().saturating_sub(1)) {
            let p = &self.paragraphs[index];
            let from = if index == sp { so } else { 0 };
            let to = if index == ep { eo } else { p.len };
            parts.push(p.slice(from, to));
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Paragraph, RevisionMark, Run, RunContent, RunProperties};
    use proptest::prelude::*;

    fn runs_paragraph(parts: &[&str]) -> Paragraph {
        let mut p = Paragraph::new();
        for part in parts {
            p.inlines.push(Inline::Run(Run::text(*part, RunProperties::new())));
        }
        p
    }

    #[test]
    fn test_extract_maps_runs() {
        let mut doc = Document::new();
        let mut p = runs_paragraph(&["Hello ", "world"]);
        p.inlines.insert(1, Inline::Raw("<w:bookmarkStart w:id=\"0\" w:name=\"b\"/>".into()));
        doc.paragraphs.push(p);
        doc.paragraphs.push(Paragraph::new());

        let view = LogicalTextView::extract(&doc);
        let para = view.paragraph(0).unwrap();
        assert_eq!(para.text, "Hello world");
        assert_eq!(
            para.runs,
            vec![
                RunSlice { inline: 0, start: 0, len: 6 },
                RunSlice { inline: 2, start: 6, len: 5 },
            ]
        );
        assert_eq!(view.global_text(), "Hello world\n");
        assert_eq!(view.global_offset(1, 0), 12);

        let pos = view.position(0, 7).unwrap();
        assert_eq!((pos.run, pos.run_offset), (Some(2), 1));
        let end = view.end_position(0, 6).unwrap();
        assert_eq!((end.run, end.run_offset), (Some(0), 6));
        assert_eq!(view.position(1, 0).unwrap().run, None);
        assert!(view.position(0, 12).is_none());
    }

    #[test]
    fn test_batch_insertions_are_invisible() {
        let mut p = runs_paragraph(&["keep"]);
        let mut inserted = Run::text(" new", RunProperties::new());
        inserted.revision.inserted = Some(RevisionMark::new(1, "A", "2024-01-01T00:00:00Z"));
        p.inlines.push(Inline::Run(inserted));
        let mut deleted = Run::text(" gone", RunProperties::new());
        deleted.revision.deleted = Some(RevisionMark::new(2, "A", "2024-01-01T00:00:00Z"));
        p.inlines.push(Inline::Run(deleted));

        let mut doc = Document::new();
        doc.paragraphs.push(p);
        assert_eq!(LogicalTextView::extract(&doc).paragraph(0).unwrap().text, "keep gone");
    }

    #[test]
    fn test_tabs_and_breaks() {
        let mut p = runs_paragraph(&["a"]);
        p.inlines.push(Inline::Run(Run::new(RunContent::Tab, RunProperties::new())));
        p.inlines.push(Inline::Run(Run::new(RunContent::Break(None), RunProperties::new())));
        p.inlines.push(Inline::Run(Run::new(RunContent::Other("<w:drawing/>".into()), RunProperties::new())));
        p.inlines.push(Inline::Run(Run::text("b", RunProperties::new())));
        let mut doc = Document::new();
        doc.paragraphs.push(p);
        let view = LogicalTextView::extract(&doc);
        assert_eq!(view.paragraph(0).unwrap().text, "a\t\nb");
        assert_eq!(view.paragraph(0).unwrap().run_at(3), Some((4, 0)));
    }

    #[test]
    fn test_text_between_paragraphs() {
        let doc = Document::from_texts(["first part", "second part"]);
        let view = LogicalTextView::extract(&doc);
        assert_eq!(view.text_between((0, 6), (1, 6)), "part\nsecond");
        assert_eq!(view.text_between((1, 0), (1, 6)), "second");
    }

    #[test]
    fn test_sentences_are_indexed() {
        let doc = Document::from_texts(["One. Two. Three."]);
        let view = LogicalTextView::extract(&doc);
        assert_eq!(view.paragraph(0).unwrap().sentences, vec![0..4, 5..9, 10..16]);
    }

    proptest! {
        #[test]
        fn prop_extraction_is_idempotent(texts in proptest::collection::vec("[A-Za-z .,!?]{0,30}", 0..6)) {
            let doc = Document::from_texts(texts.iter().map(String::as_str));
            let first = LogicalTextView::extract(&doc);
            let second = LogicalTextView::extract(&doc);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.global_text(), texts.join("\n"));
        }
    }
}
