//! Track Changes Import/Export for DOCX
//!
//! Handles the `w:ins` and `w:del` run containers. Marks read from a document
//! keep their start tag so they are written back exactly; marks created by an
//! annotation batch are serialized from their attribution.

use crate::docx::reader::{escape_xml_attr, XmlParser};
use doc_model::{MarkOrigin, RevisionMark};
use quick_xml::events::BytesStart;

/// Kind of tracked change container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Delete,
}

impl ChangeKind {
    /// Element name of the container
    pub fn element(self) -> &'static str {
        match self {
            ChangeKind::Insert => "w:ins",
            ChangeKind::Delete => "w:del",
        }
    }
}

/// Parser for track change containers
pub struct TrackChangesParser;

impl TrackChangesParser {
    /// Kind of change a start tag opens, if any
    pub fn change_kind(event: &BytesStart) -> Option<ChangeKind> {
        if XmlParser::is_w(event, "ins") {
            Some(ChangeKind::Insert)
        } else if XmlParser::is_w(event, "del") {
            Some(ChangeKind::Delete)
        } else {
            None
        }
    }

    /// Read the attribution of a `w:ins`/`w:del` start tag
    pub fn parse_mark(event: &BytesStart) -> RevisionMark {
        RevisionMark {
            id: XmlParser::get_w_attribute(event, "id")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            author: XmlParser::get_w_attribute(event, "author").unwrap_or_default(),
            date: XmlParser::get_w_attribute(event, "date"),
            origin: MarkOrigin::Source {
                open: XmlParser::open_tag(event),
            },
        }
    }
}

/// Writer for track changes in DOCX export
pub struct TrackChangesWriter;

impl TrackChangesWriter {
    /// Start tag of a change container
    pub fn open(kind: ChangeKind, mark: &RevisionMark) -> String {
        match &mark.origin {
            MarkOrigin::Source { open } => format!("<{}>", open),
            MarkOrigin::Batch => {
                let mut xml = format!(
                    r#"<{} w:id="{}" w:author="{}""#,
                    kind.element(),
                    mark.id,
                    escape_xml_attr(&mark.author)
                );
                if let Some(date) = &mark.date {
                    xml.push_str(&format!(r#" w:date="{}""#, escape_xml_attr(date)));
                }
                xml.push('>');
                xml
            }
        }
    }

    /// End tag of a change container
    pub fn close(kind: ChangeKind) -> String {
        format!("</{}>", kind.element())
    }

    /// Rewrite verbatim run content for use inside a deletion
    ///
    /// Field instructions must become `w:delInstrText` once deleted.
    pub fn deleted_form(xml: &str) -> String {
        if xml.starts_with("<w:instrText") {
            xml.replacen("<w:instrText", "<w:delInstrText", 1)
                .replace("</w:instrText>", "</w:delInstrText>")
        } else {
            xml.to_string()
        }
    }
}
