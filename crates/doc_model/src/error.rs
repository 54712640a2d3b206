//! Error types for document model operations

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocModelError {
    #[error("Paragraph not found: {0}")]
    ParagraphNotFound(usize),

    #[error("Invalid offset {offset} (text length {len})")]
    InvalidOffset { offset: usize, len: usize },

    #[error("Cannot split a non-text run at offset {0}")]
    NotSplittable(usize),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
