//! Document root - owns paragraphs and the comment collection

use crate::{Comment, DocModelError, Paragraph, Result};
use serde::{Deserialize, Serialize};

/// The annotatable content of a word-processing document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Paragraphs in document order (body, table cells, block controls)
    pub paragraphs: Vec<Paragraph>,
    /// Comment collection, existing comments first
    pub comments: Vec<Comment>,
    /// Highest numeric annotation id seen in the document
    highest_id: Option<u32>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from plain paragraph texts
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            paragraphs: texts.into_iter().map(Paragraph::with_text).collect(),
            ..Self::default()
        }
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraph(&self, index: usize) -> Result<&Paragraph> {
        self.paragraphs
            .get(index)
            .ok_or(DocModelError::ParagraphNotFound(index))
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Result<&mut Paragraph> {
        self.paragraphs
            .get_mut(index)
            .ok_or(DocModelError::ParagraphNotFound(index))
    }

    /// Append a comment record
    pub fn add_comment(&mut self, comment: Comment) {
        self.note_id(comment.id);
        self.comments.push(comment);
    }

    pub fn comment(&self, id: u32) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Record an id in use (comments, revisions, bookmarks ...)
    pub fn note_id(&mut self, id: u32) {
        self.highest_id = Some(self.highest_id.map_or(id, |h| h.max(id)));
    }

    /// First id guaranteed not to collide with any id in the document
    pub fn next_free_id(&self) -> u32 {
        self.highest_id.map_or(0, |h| h.saturating_add(1))
    }
}
