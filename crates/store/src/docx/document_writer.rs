//! Document.xml writer
//!
//! Writes the paragraph model back into the document part. Runs carry their
//! hyperlink and tracked-change context individually; consecutive runs that
//! share a context are regrouped under one `w:hyperlink` / `w:ins` / `w:del`
//! container, nested in that order.

use crate::docx::document::{BodyLayout, Segment};
use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::escape_xml;
use crate::docx::track_changes::{ChangeKind, TrackChangesWriter};
use doc_model::{Document, Hyperlink, Inline, Paragraph, RevisionMark, Run, RunContent};

/// A container element around runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrapper<'a> {
    Hyperlink(&'a Hyperlink),
    Change(ChangeKind, &'a RevisionMark),
}

impl Wrapper<'_> {
    fn open(&self) -> String {
        match self {
            Wrapper::Hyperlink(link) => format!("<{}>", link.open),
            Wrapper::Change(kind, mark) => TrackChangesWriter::open(*kind, mark),
        }
    }

    fn close(&self) -> String {
        match self {
            Wrapper::Hyperlink(_) => "</w:hyperlink>".to_string(),
            Wrapper::Change(kind, _) => TrackChangesWriter::close(*kind),
        }
    }
}

fn wrappers_of(run: &Run) -> Vec<Wrapper<'_>> {
    let mut wrappers = Vec::with_capacity(3);
    if let Some(link) = &run.hyperlink {
        wrappers.push(Wrapper::Hyperlink(link));
    }
    if let Some(mark) = &run.revision.inserted {
        wrappers.push(Wrapper::Change(ChangeKind::Insert, mark));
    }
    if let Some(mark) = &run.revision.deleted {
        wrappers.push(Wrapper::Change(ChangeKind::Delete, mark));
    }
    wrappers
}

fn common_len(a: &[Wrapper<'_>], b: &[Wrapper<'_>]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Writer for document.xml
pub struct DocumentWriter;

impl DocumentWriter {
    /// Serialize the document part
    pub fn write(document: &Document, layout: &BodyLayout) -> DocxResult<String> {
        let mut xml = String::new();
        for segment in &layout.segments {
            match segment {
                Segment::Xml(raw) => xml.push_str(raw),
                Segment::Paragraph(index) => {
                    let paragraph = document.paragraphs.get(*index).ok_or_else(|| {
                        DocxError::InvalidStructure(format!("paragraph {} missing from document", index))
                    })?;
                    Self::write_paragraph(&mut xml, paragraph);
                }
            }
        }
        Ok(xml)
    }

    fn write_paragraph(xml: &mut String, paragraph: &Paragraph) {
        xml.push('<');
        xml.push_str(&paragraph.open);
        xml.push('>');
        if let Some(properties) = &paragraph.properties {
            xml.push_str(properties);
        }

        let mut open: Vec<Wrapper<'_>> = Vec::new();
        for (inline, wanted) in paragraph.inlines.iter().zip(Self::placement(paragraph)) {
            let keep = common_len(&open, &wanted);
            while open.len() > keep {
                if let Some(wrapper) = open.pop() {
                    xml.push_str(&wrapper.close());
                }
            }
            for wrapper in &wanted[keep..] {
                xml.push_str(&wrapper.open());
                open.push(*wrapper);
            }
            Self::write_inline(xml, inline);
        }
        while let Some(wrapper) = open.pop() {
            xml.push_str(&wrapper.close());
        }

        let element = paragraph.open.split_whitespace().next().unwrap_or("w:p");
        xml.push_str(&format!("</{}>", element));
    }

    /// Containers each inline is written in
    ///
    /// Items without a context of their own (markers, raw XML) stay inside the
    /// containers shared by the runs on both sides of them.
    fn placement(paragraph: &Paragraph) -> Vec<Vec<Wrapper<'_>>> {
        let contexts: Vec<Option<Vec<Wrapper<'_>>>> = paragraph
            .inlines
            .iter()
            .map(|inline| inline.as_run().map(wrappers_of))
            .collect();

        let mut previous = Vec::with_capacity(contexts.len());
        let mut last = None;
        for (index, context) in contexts.iter().enumerate() {
            previous.push(last);
            if context.is_some() {
                last = Some(index);
            }
        }
        let mut next = vec![None; contexts.len()];
        let mut upcoming = None;
        for (index, context) in contexts.iter().enumerate().rev() {
            next[index] = upcoming;
            if context.is_some() {
                upcoming = Some(index);
            }
        }

        contexts
            .iter()
            .enumerate()
            .map(|(index, context)| match context {
                Some(wrappers) => wrappers.clone(),
                None => match (previous[index], next[index]) {
                    (Some(before), Some(after)) => {
                        let before = contexts[before].as_deref().unwrap_or_default();
                        let after = contexts[after].as_deref().unwrap_or_default();
                        before[..common_len(before, after)].to_vec()
                    }
                    _ => Vec::new(),
                },
            })
            .collect()
    }

    fn write_inline(xml: &mut String, inline: &Inline) {
        match inline {
            Inline::Run(run) => Self::write_run(xml, run),
            Inline::CommentRangeStart(id) => {
                xml.push_str(&format!(r#"<w:commentRangeStart w:id="{}"/>"#, id));
            }
            Inline::CommentRangeEnd(id) => {
                xml.push_str(&format!(r#"<w:commentRangeEnd w:id="{}"/>"#, id));
            }
            Inline::Raw(raw) => xml.push_str(raw),
        }
    }

    fn write_run(xml: &mut String, run: &Run) {
        let deleted = run.revision.is_deleted();
        xml.push('<');
        xml.push_str(run.open.as_deref().unwrap_or("w:r"));
        xml.push('>');
        xml.push_str(&run.properties.to_xml());

        match &run.content {
            RunContent::Text(text) => {
                let element = if deleted { "w:delText" } else { "w:t" };
                xml.push_str(&format!(
                    r#"<{} xml:space="preserve">{}</{}>"#,
                    element,
                    escape_xml(text),
                    element
                ));
            }
            RunContent::Tab => xml.push_str("<w:tab/>"),
            RunContent::Break(None) => xml.push_str("<w:br/>"),
            RunContent::Break(Some(raw)) => xml.push_str(raw),
            RunContent::CommentReference(id) => {
                xml.push_str(&format!(r#"<w:commentReference w:id="{}"/>"#, id));
            }
            RunContent::Other(raw) if deleted => xml.push_str(&TrackChangesWriter::deleted_form(raw)),
            RunContent::Other(raw) => xml.push_str(raw),
        }

        xml.push_str("</w:r>");
    }
}
