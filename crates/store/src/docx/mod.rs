//! DOCX Read/Write Module
//!
//! This module opens Microsoft Word DOCX files for annotation and writes them
//! back. DOCX is based on the Office Open XML (OOXML) format defined in ECMA-376.
//!
//! ## Structure
//!
//! A DOCX file is a ZIP archive containing XML files:
//! - `[Content_Types].xml` - Content type definitions
//! - `_rels/.rels` - Root relationships
//! - `word/document.xml` - Main document content
//! - `word/_rels/document.xml.rels` - Document relationships
//! - `word/comments.xml` - Comments content
//!
//! Only the main document part and the comments part are interpreted; every
//! other entry is carried through unchanged.

mod error;
mod reader;
mod package;
mod content_types;
mod relationships;
mod document;
mod document_writer;
mod track_changes;
mod comments_io;
mod writer;
mod api;

pub use error::{DocxError, DocxResult};
pub use api::{open_docx, open_docx_bytes, DocxDocument};
pub use package::{DocxPackage, PackageEntry};
pub use reader::{DocxReader, XmlParser};
pub use writer::DocxWriter;
pub use document::{BodyLayout, DocumentParser, Segment};
pub use document_writer::DocumentWriter;
pub use comments_io::{CommentsFrame, CommentsParser, CommentsWriter};
pub use track_changes::{ChangeKind, TrackChangesParser, TrackChangesWriter};
pub use relationships::{Relationship, Relationships, TargetMode};
pub use content_types::ContentTypes;

/// Relationship types used in DOCX
pub mod relationship_types {
    pub const DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const COMMENTS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
}

/// Content types for DOCX parts
pub mod content_type_values {
    pub const DOCUMENT: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const COMMENTS: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
}
