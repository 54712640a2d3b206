//! Document.xml parser
//!
//! Splits the main document part into paragraphs the annotation engine can
//! work on and the XML between them, which is kept verbatim. Every `w:p` that
//! is not nested in another paragraph is loaded, so paragraphs inside tables
//! and block-level content controls are visible too.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::{event_to_string, XmlParser};
use crate::docx::track_changes::{ChangeKind, TrackChangesParser};
use doc_model::{
    Document, Hyperlink, Inline, Paragraph, PropertyElement, Run, RunContent, RunProperties,
    RunRevision,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

/// A piece of the document part in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// XML written back unchanged
    Xml(String),
    /// Index into `Document::paragraphs`
    Paragraph(usize),
}

/// How the paragraphs of a `Document` sit inside the document part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyLayout {
    pub segments: Vec<Segment>,
}

impl BodyLayout {
    fn push_xml(&mut self, pending: &mut String) {
        if !pending.is_empty() {
            self.segments.push(Segment::Xml(std::mem::take(pending)));
        }
    }
}

/// Container context inherited by the runs of a paragraph
#[derive(Debug, Clone, Default)]
struct RunContext {
    hyperlink: Option<Hyperlink>,
    revision: RunRevision,
}

/// Parser for document.xml
#[derive(Debug, Default)]
pub struct DocumentParser {
    next_hyperlink_group: u32,
}

impl DocumentParser {
    /// Create a new document parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document.xml into the paragraph model and its layout
    pub fn parse(&mut self, content: &str) -> DocxResult<(Document, BodyLayout)> {
        let mut reader = XmlParser::from_string(content);
        let mut document = Document::new();
        let mut layout = BodyLayout::default();
        let mut pending = String::new();

        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Start(e) if XmlParser::is_w(e, "p") => {
                    let paragraph = self.parse_paragraph(&mut reader, e)?;
                    layout.push_xml(&mut pending);
                    layout.segments.push(Segment::Paragraph(document.paragraphs.len()));
                    document.paragraphs.push(paragraph);
                }
                Event::Empty(e) if XmlParser::is_w(e, "p") => {
                    layout.push_xml(&mut pending);
                    layout.segments.push(Segment::Paragraph(document.paragraphs.len()));
                    document.paragraphs.push(Paragraph {
                        open: XmlParser::open_tag(e),
                        properties: None,
                        inlines: Vec::new(),
                    });
                }
                Event::Eof => break,
                _ => pending.push_str(&event_to_string(&event)),
            }
        }
        layout.push_xml(&mut pending);

        debug!(paragraphs = document.paragraph_count(), "parsed document part");
        Ok((document, layout))
    }

    fn parse_paragraph(&mut self, reader: &mut Reader<&[u8]>, start: &BytesStart) -> DocxResult<Paragraph> {
        let mut paragraph = Paragraph {
            open: XmlParser::open_tag(start),
            properties: None,
            inlines: Vec::new(),
        };
        self.parse_children(reader, &RunContext::default(), &mut paragraph)?;
        Ok(paragraph)
    }

    /// Read the children of the paragraph or of a run container up to its end tag
    fn parse_children(
        &mut self,
        reader: &mut Reader<&[u8]>,
        context: &RunContext,
        paragraph: &mut Paragraph,
    ) -> DocxResult<()> {
        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Start(e) if XmlParser::is_w(e, "pPr") && paragraph.properties.is_none() => {
                    paragraph.properties = Some(XmlParser::capture_element(reader, e)?);
                }
                Event::Empty(e) if XmlParser::is_w(e, "pPr") && paragraph.properties.is_none() => {
                    paragraph.properties = Some(XmlParser::empty_tag(e));
                }
                Event::Start(e) if XmlParser::is_w(e, "r") => {
                    let inlines = Self::parse_run(reader, e, context)?;
                    paragraph.inlines.extend(inlines);
                }
                Event::Start(e) if XmlParser::is_w(e, "hyperlink") => {
                    let mut inner = context.clone();
                    inner.hyperlink = Some(Hyperlink {
                        open: XmlParser::open_tag(e),
                        group: self.next_hyperlink_group,
                    });
                    self.next_hyperlink_group += 1;
                    self.parse_children(reader, &inner, paragraph)?;
                }
                Event::Start(e) if TrackChangesParser::change_kind(e).is_some() => {
                    let mark = TrackChangesParser::parse_mark(e);
                    let mut inner = context.clone();
                    match TrackChangesParser::change_kind(e) {
                        Some(ChangeKind::Insert) => inner.revision.inserted = Some(mark),
                        _ => inner.revision.deleted = Some(mark),
                    }
                    self.parse_children(reader, &inner, paragraph)?;
                }
                Event::Start(e) => {
                    let xml = XmlParser::capture_element(reader, e)?;
                    paragraph.inlines.push(Inline::Raw(xml));
                }
                Event::End(_) => return Ok(()),
                Event::Eof => {
                    return Err(DocxError::XmlParse("Unexpected end of document in paragraph".into()))
                }
                _ => {
                    let xml = event_to_string(&event);
                    if !xml.trim().is_empty() {
                        paragraph.inlines.push(Inline::Raw(xml));
                    }
                }
            }
        }
    }

    /// Parse a `w:r` into one run per content item
    ///
    /// A run without content items is kept as raw XML.
    fn parse_run(reader: &mut Reader<&[u8]>, start: &BytesStart, context: &RunContext) -> DocxResult<Vec<Inline>> {
        let open = XmlParser::open_tag(start);
        let mut properties = RunProperties::new();
        let mut contents = Vec::new();

        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Start(e) if XmlParser::is_w(e, "rPr") => {
                    properties = Self::parse_run_properties(reader)?;
                }
                Event::Start(e) if XmlParser::is_w(e, "t") || XmlParser::is_w(e, "delText") => {
                    let text = XmlParser::read_text(reader)?;
                    if !text.is_empty() {
                        contents.push(RunContent::Text(text));
                    }
                }
                Event::Empty(e)
                    if XmlParser::is_w(e, "rPr") || XmlParser::is_w(e, "t") || XmlParser::is_w(e, "delText") => {}
                Event::Empty(e) if XmlParser::is_w(e, "tab") => contents.push(RunContent::Tab),
                Event::Empty(e) if XmlParser::is_w(e, "br") || XmlParser::is_w(e, "cr") => {
                    let plain = XmlParser::is_w(e, "br") && e.attributes().next().is_none();
                    contents.push(RunContent::Break(if plain {
                        None
                    } else {
                        Some(XmlParser::empty_tag(e))
                    }));
                }
                Event::Empty(e) => contents.push(RunContent::Other(XmlParser::empty_tag(e))),
                Event::Start(e) => {
                    contents.push(RunContent::Other(XmlParser::capture_element(reader, e)?));
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(DocxError::XmlParse("Unexpected end of document in run".into()))
                }
                _ => {}
            }
        }

        if contents.is_empty() {
            return Ok(vec![Inline::Raw(format!("<{}>{}</w:r>", open, properties.to_xml()))]);
        }

        Ok(contents
            .into_iter()
            .map(|content| {
                Inline::Run(Run {
                    open: Some(open.clone()),
                    properties: properties.clone(),
                    content,
                    hyperlink: context.hyperlink.clone(),
                    revision: context.revision.clone(),
                })
            })
            .collect())
    }

    fn parse_run_properties(reader: &mut Reader<&[u8]>) -> DocxResult<RunProperties> {
        let mut elements = Vec::new();
        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Empty(e) => elements.push(PropertyElement::new(
                    XmlParser::local_name(e),
                    XmlParser::get_w_attribute(e, "val"),
                    XmlParser::empty_tag(e),
                )),
                Event::Start(e) => {
                    let value = XmlParser::get_w_attribute(e, "val");
                    let xml = XmlParser::capture_element(reader, e)?;
                    elements.push(PropertyElement::new(XmlParser::local_name(e), value, xml));
                }
                Event::End(_) => return Ok(RunProperties::from_elements(elements)),
                Event::Eof => {
                    return Err(DocxError::XmlParse("Unexpected end of document in run properties".into()))
                }
                _ => {}
            }
        }
    }
}
