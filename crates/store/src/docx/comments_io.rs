//! Comments Import/Export for DOCX
//!
//! Existing `w:comment` elements are carried verbatim; new comments are written
//! with one `CommentText` paragraph per body paragraph, the first one opening
//! with the annotation reference mark.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::{escape_xml, escape_xml_attr, event_to_string, XmlParser};
use doc_model::{Comment, CommentBody, RunProperties, StyledText};
use quick_xml::events::Event;

const DEFAULT_PROLOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";
const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DEFAULT_ROOT: &str = r#"w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordml""#;

/// Frame of a comments part: everything except the comments themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentsFrame {
    /// Declaration and anything else before the root element
    pub prolog: String,
    /// Root start tag content (namespace declarations included)
    pub root_open: String,
    /// Qualified root name, used for the closing tag
    pub root_name: String,
}

impl Default for CommentsFrame {
    fn default() -> Self {
        Self {
            prolog: DEFAULT_PROLOG.to_string(),
            root_open: DEFAULT_ROOT.to_string(),
            root_name: "w:comments".to_string(),
        }
    }
}

/// Parser for comments.xml
pub struct CommentsParser;

impl CommentsParser {
    /// Parse comments.xml into its frame and comment records
    pub fn parse(content: &str) -> DocxResult<(CommentsFrame, Vec<Comment>)> {
        let mut reader = XmlParser::from_string(content);
        let mut prolog = String::new();
        let mut root_open = None;
        let mut root_name = String::new();
        let mut comments = Vec::new();

        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Start(e) | Event::Empty(e) if root_open.is_none() => {
                    root_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    root_open = Some(XmlParser::open_tag(e));
                }
                Event::Start(e) if XmlParser::is_w(e, "comment") => {
                    let id = XmlParser::get_w_attribute(e, "id")
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| DocxError::InvalidStructure("Comment missing w:id".into()))?;
                    let author = XmlParser::get_w_attribute(e, "author").unwrap_or_default();
                    let initials = XmlParser::get_w_attribute(e, "initials");
                    let date = XmlParser::get_w_attribute(e, "date");
                    let xml = XmlParser::capture_element(&mut reader, e)?;
                    comments.push(Comment {
                        id,
                        author,
                        initials,
                        date,
                        body: CommentBody::Source(xml),
                    });
                }
                Event::Empty(e) if XmlParser::is_w(e, "comment") => {
                    if let Some(id) = XmlParser::get_w_attribute(e, "id").and_then(|s| s.parse().ok()) {
                        comments.push(Comment {
                            id,
                            author: XmlParser::get_w_attribute(e, "author").unwrap_or_default(),
                            initials: XmlParser::get_w_attribute(e, "initials"),
                            date: XmlParser::get_w_attribute(e, "date"),
                            body: CommentBody::Source(XmlParser::empty_tag(e)),
                        });
                    }
                }
                Event::Eof => break,
                _ if root_open.is_none() => prolog.push_str(&event_to_string(&event)),
                _ => {}
            }
        }

        let mut root_open = root_open
            .ok_or_else(|| DocxError::InvalidStructure("comments part has no root element".into()))?;
        // New comments are written with the `w` prefix
        if !root_open.contains("xmlns:w=") {
            root_open.push_str(&format!(r#" xmlns:w="{}""#, W_NAMESPACE));
        }
        Ok((CommentsFrame { prolog, root_open, root_name }, comments))
    }
}

/// Writer for comments in DOCX export
pub struct CommentsWriter;

impl CommentsWriter {
    /// Generate comments.xml content
    pub fn write_comments_xml(frame: &CommentsFrame, comments: &[Comment]) -> String {
        let mut xml = String::new();
        xml.push_str(&frame.prolog);
        xml.push('<');
        xml.push_str(&frame.root_open);
        xml.push('>');

        for comment in comments {
            Self::write_comment(&mut xml, comment);
        }

        xml.push_str("</");
        xml.push_str(&frame.root_name);
        xml.push('>');
        xml
    }

    /// Write a single comment element
    fn write_comment(xml: &mut String, comment: &Comment) {
        let paragraphs = match &comment.body {
            CommentBody::Source(raw) => {
                xml.push_str(raw);
                return;
            }
            CommentBody::Rich(paragraphs) => paragraphs,
        };

        xml.push_str(&format!(
            r#"<w:comment w:id="{}" w:author="{}""#,
            comment.id,
            escape_xml_attr(&comment.author)
        ));
        if let Some(ref date) = comment.date {
            xml.push_str(&format!(r#" w:date="{}""#, escape_xml_attr(date)));
        }
        if let Some(ref initials) = comment.initials {
            xml.push_str(&format!(r#" w:initials="{}""#, escape_xml_attr(initials)));
        }
        xml.push('>');

        if paragraphs.is_empty() {
            Self::write_paragraph(xml, &[], true);
        }
        for (index, paragraph) in paragraphs.iter().enumerate() {
            Self::write_paragraph(xml, paragraph, index == 0);
        }

        xml.push_str("</w:comment>");
    }

    fn write_paragraph(xml: &mut String, spans: &[StyledText], with_mark: bool) {
        xml.push_str("<w:p><w:pPr><w:pStyle w:val=\"CommentText\"/></w:pPr>");
        if with_mark {
            xml.push_str("<w:r><w:rPr><w:rStyle w:val=\"CommentReference\"/></w:rPr>");
            xml.push_str("<w:annotationRef/></w:r>");
        }
        for span in spans {
            xml.push_str("<w:r>");
            xml.push_str(&RunProperties::from_style(span.style).to_xml());
            xml.push_str("<w:t xml:space=\"preserve\">");
            xml.push_str(&escape_xml(&span.text));
            xml.push_str("</w:t></w:r>");
        }
        xml.push_str("</w:p>");
    }
}
