//! DOCX Writer Infrastructure
//!
//! Writes a package back into a ZIP archive, entry order and compression
//! method preserved.

use crate::docx::error::DocxResult;
use crate::docx::package::DocxPackage;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Main DOCX writer
pub struct DocxWriter;

impl DocxWriter {
    /// Serialize every entry of the package
    pub fn write(package: &DocxPackage) -> DocxResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in package.entries() {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::package::PackageEntry;
    use crate::docx::reader::DocxReader;

    #[test]
    fn test_write_then_read_keeps_entries() {
        let entries = vec![
            PackageEntry {
                name: "[Content_Types].xml".into(),
                data: b"<Types/>".to_vec(),
                compression: CompressionMethod::Deflated,
                is_dir: false,
            },
            PackageEntry {
                name: "word/media/image1.png".into(),
                data: vec![0x89, 0x50, 0x4e, 0x47, 0, 1, 2, 3],
                compression: CompressionMethod::Stored,
                is_dir: false,
            },
        ];
        let package = DocxPackage::from_entries(entries);
        let bytes = DocxWriter::write(&package).unwrap();

        let read = DocxReader::read(&bytes).unwrap();
        let names: Vec<_> = read.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["[Content_Types].xml", "word/media/image1.png"]);
        assert_eq!(read.part("word/media/image1.png"), Some(&[0x89, 0x50, 0x4e, 0x47, 0, 1, 2, 3][..]));
        assert_eq!(read.entries()[1].compression, CompressionMethod::Stored);
    }

    #[test]
    fn test_read_rejects_non_docx_zip() {
        let package = DocxPackage::from_entries(vec![PackageEntry {
            name: "readme.txt".into(),
            data: b"hi".to_vec(),
            compression: CompressionMethod::Deflated,
            is_dir: false,
        }]);
        let bytes = DocxWriter::write(&package).unwrap();
        assert!(DocxReader::read(&bytes).is_err());
        assert!(DocxReader::read(b"not a zip").is_err());
    }
}
