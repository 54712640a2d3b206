//! [Content_Types].xml parsing and generation
//!
//! Only read when a comments part has to be registered; defaults and
//! overrides are written back in their original order.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::{escape_xml_attr, XmlParser};
use quick_xml::events::Event;

/// Represents the content types in a DOCX package, in file order
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Default content types by extension (e.g., "xml" -> "application/xml")
    pub defaults: Vec<(String, String)>,
    /// Override content types by part name (e.g., "/word/document.xml" -> "...")
    pub overrides: Vec<(String, String)>,
}

fn normalize_part_name(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

impl ContentTypes {
    /// Parse [Content_Types].xml from its content
    pub fn parse(content: &str) -> DocxResult<Self> {
        let mut result = Self::default();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    if XmlParser::matches_element(name.as_ref(), "Default") {
                        if let (Some(ext), Some(ct)) = (
                            XmlParser::get_attribute(e, b"Extension"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.defaults.push((ext, ct));
                        }
                    } else if XmlParser::matches_element(name.as_ref(), "Override") {
                        if let (Some(part), Some(ct)) = (
                            XmlParser::get_attribute(e, b"PartName"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.overrides.push((part, ct));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocxError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Get the content type for a given path
    pub fn get_content_type(&self, path: &str) -> Option<&str> {
        let normalized_path = normalize_part_name(path);
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(part, _)| part.eq_ignore_ascii_case(&normalized_path))
        {
            return Some(ct);
        }

        let ext = path.rsplit('.').next()?;
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }

    /// Add or replace the override for a specific part
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        let normalized = normalize_part_name(part_name);
        match self.overrides.iter_mut().find(|(part, _)| *part == normalized) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.overrides.push((normalized, content_type.to_string())),
        }
    }

    /// Generate XML content for [Content_Types].xml
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);

        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml_attr(ext),
                escape_xml_attr(ct)
            ));
        }

        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml_attr(part),
                escape_xml_attr(ct)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}
