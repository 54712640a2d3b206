//! Public API for opening and saving DOCX files
//!
//! A `DocxDocument` owns the package it was read from, the paragraph model of
//! the main document part and the information needed to write both back.

use crate::docx::comments_io::{CommentsFrame, CommentsParser, CommentsWriter};
use crate::docx::content_types::ContentTypes;
use crate::docx::document::{BodyLayout, DocumentParser};
use crate::docx::document_writer::DocumentWriter;
use crate::docx::error::{DocxError, DocxResult};
use crate::docx::package::DocxPackage;
use crate::docx::reader::{DocxReader, XmlParser};
use crate::docx::relationships::{
    relative_target, rels_path_for, resolve_target, Relationships, TargetMode,
};
use crate::docx::writer::DocxWriter;
use crate::docx::{content_type_values, relationship_types};
use doc_model::Document;
use std::path::Path;
use tracing::{debug, warn};

/// Where the comments part lives and whether it is wired into the package
#[derive(Debug, Clone)]
struct CommentsPart {
    path: String,
    frame: CommentsFrame,
    /// The part exists in the source package
    exists: bool,
    /// The document relationships already point at the part
    related: bool,
}

/// An opened DOCX file
#[derive(Debug, Clone)]
pub struct DocxDocument {
    package: DocxPackage,
    document_part: String,
    layout: BodyLayout,
    comments: CommentsPart,
    document: Document,
}

impl DocxDocument {
    /// Read a DOCX package from bytes
    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        let package = DocxReader::read(bytes)?;
        let document_part = Self::main_document_path(&package)?;

        let content = package.part_string(&document_part)?;
        let (mut document, layout) = DocumentParser::new().parse(&content)?;
        let mut highest_id = XmlParser::max_w_id(&content)?;

        let rels_path = rels_path_for(&document_part);
        let doc_rels = if package.has_part(&rels_path) {
            Relationships::parse(&package.part_string(&rels_path)?)?
        } else {
            Relationships::new()
        };

        let comments = match doc_rels.get_by_type(relationship_types::COMMENTS) {
            Some(rel) => {
                let path = resolve_target(&document_part, &rel.target);
                if package.has_part(&path) {
                    let xml = package.part_string(&path)?;
                    let (frame, existing) = CommentsParser::parse(&xml)?;
                    highest_id = highest_id.max(XmlParser::max_w_id(&xml)?);
                    debug!(count = existing.len(), part = %path, "loaded existing comments");
                    document.comments = existing;
                    CommentsPart { path, frame, exists: true, related: true }
                } else {
                    warn!(part = %path, "comments relationship points at a missing part");
                    CommentsPart { path, frame: CommentsFrame::default(), exists: false, related: true }
                }
            }
            None => CommentsPart {
                path: Self::free_comments_path(&package, &document_part),
                frame: CommentsFrame::default(),
                exists: false,
                related: false,
            },
        };

        if let Some(id) = highest_id {
            document.note_id(id);
        }

        Ok(Self {
            package,
            document_part,
            layout,
            comments,
            document,
        })
    }

    /// Read a DOCX file from disk
    pub fn open(path: &Path) -> DocxResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocxError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                ))
            } else {
                DocxError::Io(e)
            }
        })?;
        Self::from_bytes(&bytes)
    }

    fn main_document_path(package: &DocxPackage) -> DocxResult<String> {
        if package.has_part("_rels/.rels") {
            let rels = Relationships::parse(&package.part_string("_rels/.rels")?)?;
            if let Some(rel) = rels.get_by_type(relationship_types::DOCUMENT) {
                return Ok(resolve_target("", &rel.target));
            }
        }
        if package.has_part("word/document.xml") {
            return Ok("word/document.xml".to_string());
        }
        Err(DocxError::MissingPart("word/document.xml".to_string()))
    }

    /// A comments part name next to the main document that no entry uses
    fn free_comments_path(package: &DocxPackage, document_part: &str) -> String {
        let dir = document_part.rsplit_once('/').map(|(d, _)| format!("{}/", d)).unwrap_or_default();
        let mut candidate = format!("{}comments.xml", dir);
        let mut n = 1;
        while package.has_part(&candidate) {
            candidate = format!("{}comments{}.xml", dir, n);
            n += 1;
        }
        candidate
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Serialize the (possibly modified) document as DOCX bytes
    ///
    /// Entries other than the main document part, the comments part and the
    /// bookkeeping parts they need are written back unchanged.
    pub fn to_bytes(&self) -> DocxResult<Vec<u8>> {
        let mut package = self.package.clone();

        let xml = DocumentWriter::write(&self.document, &self.layout)?;
        package.set_part(&self.document_part, xml.into_bytes());

        if self.comments.exists || !self.document.comments.is_empty() {
            let xml = CommentsWriter::write_comments_xml(&self.comments.frame, &self.document.comments);
            package.set_part(&self.comments.path, xml.into_bytes());

            if !self.comments.related {
                let rels_path = rels_path_for(&self.document_part);
                let mut rels = if package.has_part(&rels_path) {
                    Relationships::parse(&package.part_string(&rels_path)?)?
                } else {
                    Relationships::new()
                };
                let id = rels.add(
                    relationship_types::COMMENTS,
                    &relative_target(&self.document_part, &self.comments.path),
                    TargetMode::Internal,
                );
                debug!(rel = %id, part = %self.comments.path, "added comments relationship");
                package.set_part(&rels_path, rels.to_xml().into_bytes());
            }

            if !self.comments.exists {
                let mut content_types = ContentTypes::parse(&package.part_string("[Content_Types].xml")?)?;
                content_types.add_override(&self.comments.path, content_type_values::COMMENTS);
                package.set_part("[Content_Types].xml", content_types.to_xml().into_bytes());
            }
        }

        DocxWriter::write(&package)
    }

    /// Write the document to disk
    pub fn save(&self, path: &Path) -> DocxResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// Open a DOCX from an in-memory byte slice
pub fn open_docx_bytes(bytes: &[u8]) -> DocxResult<DocxDocument> {
    DocxDocument::from_bytes(bytes)
}

/// Open a DOCX file from disk
pub fn open_docx(path: &Path) -> DocxResult<DocxDocument> {
    DocxDocument::open(path)
}
