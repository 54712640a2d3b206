//! In-memory DOCX package
//!
//! Holds every archive entry in its original order. Parts are looked up
//! case-insensitively, as OPC part names are.

use crate::docx::error::{DocxError, DocxResult};
use zip::CompressionMethod;

/// One entry of the ZIP archive
#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub is_dir: bool,
}

/// The entries of a DOCX archive
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub(crate) fn from_entries(entries: Vec<PackageEntry>) -> Self {
        Self { entries }
    }

    fn find(&self, name: &str) -> Option<&PackageEntry> {
        self.entries
            .iter()
            .find(|e| !e.is_dir && e.name.eq_ignore_ascii_case(name))
    }

    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Raw bytes of a part
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.find(name).map(|e| e.data.as_slice())
    }

    /// A part decoded as UTF-8 text
    pub fn part_string(&self, name: &str) -> DocxResult<String> {
        let data = self
            .part(name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
        Ok(String::from_utf8(data.to_vec())?)
    }

    /// Replace the content of a part, or append it when it does not exist yet
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self
            .entries
            .iter_mut()
            .find(|e| !e.is_dir && e.name.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                is_dir: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, data: &str) -> PackageEntry {
        PackageEntry {
            name: name.to_string(),
            data: data.as_bytes().to_vec(),
            compression: CompressionMethod::Stored,
            is_dir: false,
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let package = DocxPackage::from_entries(vec![entry("word/Document.xml", "<x/>")]);
        assert!(package.has_part("word/document.xml"));
        assert_eq!(package.part_string("WORD/document.xml").unwrap(), "<x/>");
        assert!(matches!(package.part_string("word/comments.xml"), Err(DocxError::MissingPart(_))));
    }

    #[test]
    fn test_set_part_replaces_in_place() {
        let mut package = DocxPackage::from_entries(vec![entry("a.xml", "1"), entry("b.xml", "2")]);
        package.set_part("a.xml", b"3".to_vec());
        package.set_part("c.xml", b"4".to_vec());
        let names: Vec<_> = package.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.xml", "b.xml", "c.xml"]);
        assert_eq!(package.part("a.xml"), Some(&b"3"[..]));
        assert_eq!(package.entries()[0].compression, CompressionMethod::Stored);
        assert_eq!(package.entries()[2].compression, CompressionMethod::Deflated);
    }
}
