//! Comment model - review comments anchored to document text
//!
//! Comments that came with the source document are carried verbatim; comments
//! added by the annotation engine hold rich paragraphs that are serialized when
//! the document is written.

use crate::StyledText;
use serde::{Deserialize, Serialize};

/// Body of a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentBody {
    /// The complete `w:comment` element as read from the package
    Source(String),
    /// Paragraphs of styled text
    Rich(Vec<Vec<StyledText>>),
}

/// A comment record of the document's comment collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id, shared with the range markers in the document body
    pub id: u32,
    pub author: String,
    pub initials: Option<String>,
    /// ISO 8601 timestamp
    pub date: Option<String>,
    pub body: CommentBody,
}

impl Comment {
    /// Create a new rich comment
    pub fn new(
        id: u32,
        author: impl Into<String>,
        initials: impl Into<String>,
        date: impl Into<String>,
        paragraphs: Vec<Vec<StyledText>>,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            initials: Some(initials.into()),
            date: Some(date.into()),
            body: CommentBody::Rich(paragraphs),
        }
    }

    /// Plain text of a rich comment, paragraphs joined by newlines
    pub fn plain_text(&self) -> Option<String> {
        match &self.body {
            CommentBody::Source(_) => None,
            CommentBody::Rich(paragraphs) => Some(
                paragraphs
                    .iter()
                    .map(|p| p.iter().map(|s| s.text.as_str()).collect::<String>())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextStyle;

    #[test]
    fn test_plain_text() {
        let comment = Comment::new(
            3,
            "Reviewer",
            "RV",
            "2024-01-15T10:30:00Z",
            vec![
                vec![StyledText::new("Check", TextStyle::bold()), StyledText::plain(" this")],
                vec![StyledText::plain("second line")],
            ],
        );
        assert_eq!(comment.plain_text().as_deref(), Some("Check this\nsecond line"));
        assert_eq!(comment.initials.as_deref(), Some("RV"));
    }

    #[test]
    fn test_source_comment_has_no_plain_text() {
        let comment = Comment {
            id: 0,
            author: "A".into(),
            initials: None,
            date: None,
            body: CommentBody::Source("<w:comment w:id=\"0\"/>".into()),
        };
        assert!(comment.plain_text().is_none());
    }
}
