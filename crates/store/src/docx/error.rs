//! Errors raised while opening or saving a DOCX package

use thiserror::Error;

/// Fatal package errors; annotation-level failures never use this type
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not a readable ZIP archive
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("Invalid DOCX structure: {0}")]
    InvalidStructure(String),

    /// A part the package must have, usually `word/document.xml`
    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Part is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for DocxError {
    fn from(err: quick_xml::Error) -> Self {
        DocxError::XmlParse(err.to_string())
    }
}

pub type DocxResult<T> = std::result::Result<T, DocxError>;
