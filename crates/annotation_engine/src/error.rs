//! Error types for annotation operations

use store::DocxError;
use thiserror::Error;

/// Why a single annotation request could not be applied
///
/// These never abort a batch; they are reported in the request's result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("Text not found: {find:?}")]
    TextNotFound { find: String },

    #[error("Occurrence {requested} of {find:?} requested but only {found} found")]
    InsufficientOccurrences {
        find: String,
        requested: usize,
        found: usize,
    },

    #[error("Paragraph index {index} out of range (document has {count} paragraphs)")]
    ParagraphOutOfRange { index: usize, count: usize },

    #[error("Sentence index {index} out of range (paragraph {paragraph} has {count} sentences)")]
    SentenceOutOfRange {
        paragraph: usize,
        index: usize,
        count: usize,
    },

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot {0} an empty span")]
    EmptySpan(&'static str),

    #[error("Document model error: {0}")]
    Model(#[from] doc_model::DocModelError),
}

impl AnnotationError {
    /// Stable machine-readable name of the error class
    pub fn reason(&self) -> &'static str {
        match self {
            AnnotationError::TextNotFound { .. } => "textNotFound",
            AnnotationError::InsufficientOccurrences { .. } => "insufficientOccurrences",
            AnnotationError::ParagraphOutOfRange { .. } => "paragraphOutOfRange",
            AnnotationError::SentenceOutOfRange { .. } => "sentenceOutOfRange",
            AnnotationError::Malformed(_) => "malformedRequest",
            AnnotationError::Conflict(_) => "conflict",
            AnnotationError::EmptySpan(_) => "emptySpan",
            AnnotationError::Model(_) => "documentModel",
        }
    }
}

/// Errors that abort a whole batch
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Document error: {0}")]
    Docx(#[from] DocxError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnnotationError>;
