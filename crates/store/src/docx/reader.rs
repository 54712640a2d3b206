//! ZIP archive reading and XML parsing utilities

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::package::{DocxPackage, PackageEntry};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Reads every entry of a DOCX archive into memory
pub struct DocxReader;

impl DocxReader {
    /// Read a package from raw bytes
    pub fn read(bytes: &[u8]) -> DocxResult<DocxPackage> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut data = Vec::new();
            if !file.is_dir() {
                file.read_to_end(&mut data)?;
            }
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let package = DocxPackage::from_entries(entries);
        if !package.has_part("[Content_Types].xml") {
            return Err(DocxError::InvalidStructure(
                "Missing [Content_Types].xml".to_string(),
            ));
        }
        Ok(package)
    }
}

/// XML reader utilities for parsing DOCX XML content
pub struct XmlParser;

impl XmlParser {
    /// Create a new XML reader from a string
    ///
    /// Text is not trimmed: whitespace inside `w:t` is significant.
    pub fn from_string(content: &str) -> Reader<&[u8]> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(false);
        reader
    }

    /// Get an attribute value (unescaped) from an event
    pub fn get_attribute(event: &BytesStart, name: &[u8]) -> Option<String> {
        event
            .attributes()
            .filter_map(|a| a.ok())
            .find(|a| a.key.as_ref() == name)
            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Get an attribute value with a namespace prefix
    pub fn get_prefixed_attribute(event: &BytesStart, prefix: &str, local: &str) -> Option<String> {
        let key = format!("{}:{}", prefix, local);
        Self::get_attribute(event, key.as_bytes())
    }

    /// Get a w: namespaced attribute (most common in DOCX)
    pub fn get_w_attribute(event: &BytesStart, name: &str) -> Option<String> {
        Self::get_prefixed_attribute(event, "w", name)
    }

    /// Check if an element name matches with optional namespace prefix
    pub fn matches_element(name: &[u8], expected: &str) -> bool {
        let name_str = std::str::from_utf8(name).unwrap_or("");
        name_str == expected || name_str.ends_with(&format!(":{}", expected))
    }

    /// Check for a WordprocessingML element (`w:` prefix)
    pub fn is_w(event: &BytesStart, local: &str) -> bool {
        let name = event.name();
        let name = name.as_ref();
        name.len() == local.len() + 2 && name.starts_with(b"w:") && &name[2..] == local.as_bytes()
    }

    /// Local name of an element as a string
    pub fn local_name(event: &BytesStart) -> String {
        String::from_utf8_lossy(event.local_name().as_ref()).into_owned()
    }

    /// Serialize a start tag as an empty element (`<name attrs/>`)
    pub fn empty_tag(event: &BytesStart) -> String {
        format!("<{}/>", raw(event))
    }

    /// Start tag content without angle brackets (`w:p w:rsidR="..."`)
    pub fn open_tag(event: &BytesStart) -> String {
        raw(event)
    }

    /// Read the remainder of an element whose start tag was just consumed and
    /// return it verbatim, start tag included
    pub fn capture_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> DocxResult<String> {
        let mut xml = format!("<{}>", raw(start));
        let mut depth = 1usize;
        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => {
                    return Err(DocxError::XmlParse(format!(
                        "Unexpected end of document inside <{}>",
                        Self::local_name(start)
                    )))
                }
                _ => {}
            }
            xml.push_str(&event_to_string(&event));
            if depth == 0 {
                return Ok(xml);
            }
        }
    }

    /// Collect the unescaped text of an element whose start tag was just consumed
    pub fn read_text(reader: &mut Reader<&[u8]>) -> DocxResult<String> {
        let mut text = String::new();
        loop {
            match reader.read_event()? {
                Event::Text(e) => {
                    let unescaped = e
                        .unescape()
                        .map_err(|e| DocxError::XmlParse(e.to_string()))?;
                    text.push_str(&unescaped);
                }
                Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
                Event::End(_) => return Ok(text),
                Event::Eof => {
                    return Err(DocxError::XmlParse("Unexpected end of document in text".into()))
                }
                _ => {}
            }
        }
    }

    /// Highest numeric `w:id` in a part (comments, revisions, bookmarks ...)
    pub fn max_w_id(content: &str) -> DocxResult<Option<u32>> {
        let mut reader = Self::from_string(content);
        let mut max: Option<u32> = None;
        loop {
            match reader.read_event()? {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    if let Some(id) = Self::get_w_attribute(e, "id").and_then(|s| s.parse::<u32>().ok()) {
                        max = Some(max.map_or(id, |m| m.max(id)));
                    }
                }
                Event::Eof => return Ok(max),
                _ => {}
            }
        }
    }
}

fn raw(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Write an event back as XML text, byte-for-byte where possible
#[allow(unreachable_patterns)]
pub fn event_to_string(event: &Event<'_>) -> String {
    match event {
        Event::Start(e) => format!("<{}>", raw(e)),
        Event::Empty(e) => format!("<{}/>", raw(e)),
        Event::End(e) => format!("</{}>", raw(e)),
        Event::Text(e) => raw(e),
        Event::CData(e) => format!("<![CDATA[{}]]>", raw(e)),
        Event::Comment(e) => format!("<!--{}-->", raw(e)),
        Event::Decl(e) => format!("<?{}?>", raw(e)),
        Event::PI(e) => format!("<?{}?>", raw(e)),
        Event::DocType(e) => format!("<!DOCTYPE {}>", raw(e).trim()),
        Event::Eof => String::new(),
        _ => String::new(),
    }
}

/// Escape XML text content
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape XML attribute value
pub fn escape_xml_attr(s: &str) -> String {
    escape_xml(s).replace('"', "&quot;")
}
