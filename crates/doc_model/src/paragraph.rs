//! Paragraph node - an ordered sequence of inline items

use crate::{DocModelError, Result, Run};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An item inside a paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inline {
    /// A text-bearing run
    Run(Run),
    /// Start of a commented range
    CommentRangeStart(u32),
    /// End of a commented range
    CommentRangeEnd(u32),
    /// Paragraph content the model does not interpret, written back verbatim
    Raw(String),
}

impl Inline {
    pub fn as_run(&self) -> Option<&Run> {
        match self {
            Inline::Run(run) => Some(run),
            _ => None,
        }
    }

    pub fn as_run_mut(&mut self) -> Option<&mut Run> {
        match self {
            Inline::Run(run) => Some(run),
            _ => None,
        }
    }

    /// Characters this item contributes to the logical text view
    pub fn anchor_len(&self) -> usize {
        self.as_run().map(Run::anchor_len).unwrap_or(0)
    }
}

/// A paragraph of the document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Start tag content of the source `w:p`, without angle brackets
    pub open: String,
    /// The `w:pPr` element verbatim
    pub properties: Option<String>,
    pub inlines: Vec<Inline>,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Self {
            open: "w:p".to_string(),
            properties: None,
            inlines: Vec::new(),
        }
    }

    /// Paragraph holding a single plain run
    pub fn with_text(text: &str) -> Self {
        let mut para = Self::new();
        para.inlines.push(Inline::Run(Run::text(text, Default::default())));
        para
    }

    /// Concatenated text of all anchorable runs
    pub fn logical_text(&self) -> String {
        self.inlines
            .iter()
            .filter_map(Inline::as_run)
            .filter(|r| r.is_anchorable())
            .map(|r| r.content.logical_text())
            .collect()
    }

    /// Length of the logical text in characters
    pub fn logical_len(&self) -> usize {
        self.inlines.iter().map(Inline::anchor_len).sum()
    }

    /// Locate a character offset: the inline holding that character and the
    /// offset inside it
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (index, inline) in self.inlines.iter().enumerate() {
            let len = inline.anchor_len();
            if len > 0 && offset < start + len {
                return Some((index, offset - start));
            }
            start += len;
        }
        None
    }

    /// Make sure a run boundary falls at `offset`, splitting the run that
    /// straddles it
    pub fn split_at(&mut self, offset: usize) -> Result<()> {
        let len = self.logical_len();
        if offset > len {
            return Err(DocModelError::InvalidOffset { offset, len });
        }
        if let Some((index, within)) = self.locate(offset) {
            if within > 0 {
                let run = self.inlines[index]
                    .as_run()
                    .ok_or(DocModelError::NotSplittable(offset))?;
                let (left, right) = run.split_at(within)?;
                self.inlines[index] = Inline::Run(left);
                self.inlines.insert(index + 1, Inline::Run(right));
            }
        }
        Ok(())
    }

    /// Inline index at which content placed "before character `offset`" goes
    ///
    /// Requires a run boundary at `offset`. At the end of the text this is the
    /// position right after the last anchorable run.
    pub fn index_before(&self, offset: usize) -> usize {
        match self.locate(offset) {
            Some((index, _)) => index,
            None => self.index_after_text(),
        }
    }

    /// Inline index right after the character preceding `end`
    ///
    /// Requires a run boundary at `end`.
    pub fn index_after(&self, end: usize) -> usize {
        if end == 0 {
            return self.index_before(0);
        }
        match self.locate(end - 1) {
            Some((index, _)) => index + 1,
            None => self.index_after_text(),
        }
    }

    /// Inline range covering the characters `[start, end)`
    pub fn inline_range(&self, start: usize, end: usize) -> Range<usize> {
        self.index_before(start)..self.index_after(end)
    }

    fn index_after_text(&self) -> usize {
        self.inlines
            .iter()
            .rposition(|i| i.anchor_len() > 0)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Insert items at an inline index
    pub fn insert_inlines(&mut self, at: usize, items: Vec<Inline>) {
        let at = at.min(self.inlines.len());
        self.inlines.splice(at..at, items);
    }

    /// Iterate runs in an inline range
    pub fn runs_in(&self, range: Range<usize>) -> impl Iterator<Item = &Run> {
        self.inlines[range].iter().filter_map(Inline::as_run)
    }

    /// Iterate runs in an inline range mutably
    pub fn runs_in_mut(&mut self, range: Range<usize>) -> impl Iterator<Item = &mut Run> {
        self.inlines[range].iter_mut().filter_map(Inline::as_run_mut)
    }
}
