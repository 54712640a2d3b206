//! Integration tests for DOCX package reading and writing
//!
//! Packages are assembled in memory with the zip crate, opened, optionally
//! modified through the document model and written back.

use doc_model::{Comment, Inline, Run, RunContent, RunProperties, StyledText};
use std::io::{Cursor, Read, Write};
use store::{open_docx, open_docx_bytes, DocxError};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOC_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#,
        body
    )
}

fn build_docx(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn simple_docx(body: &str) -> Vec<u8> {
    let document = document_xml(body);
    build_docx(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", &document),
        ("word/_rels/document.xml.rels", DOC_RELS),
        ("word/styles.xml", STYLES),
    ])
}

fn read_part(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    Some(content)
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
}

#[test]
fn test_open_reads_paragraph_text() {
    let bytes = simple_docx(
        r#"<w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Second </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r></w:p>"#,
    );
    let docx = open_docx_bytes(&bytes).unwrap();
    let doc = docx.document();
    assert_eq!(doc.paragraph_count(), 2);
    assert_eq!(doc.paragraphs[0].logical_text(), "First paragraph.");
    assert_eq!(doc.paragraphs[1].logical_text(), "Second bold");
    assert!(doc.comments.is_empty());
}

#[test]
fn test_unmodified_save_preserves_parts() {
    let body = r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">Title</w:t></w:r></w:p>"#;
    let bytes = simple_docx(body);
    let saved = open_docx_bytes(&bytes).unwrap().to_bytes().unwrap();

    assert_eq!(entry_names(&saved), entry_names(&bytes));
    assert_eq!(read_part(&saved, "word/styles.xml").unwrap(), STYLES);
    assert_eq!(read_part(&saved, "word/_rels/document.xml.rels").unwrap(), DOC_RELS);
    assert_eq!(read_part(&saved, "word/document.xml").unwrap(), document_xml(body));
    assert!(read_part(&saved, "word/comments.xml").is_none());
}

#[test]
fn test_new_comment_creates_comments_part() {
    let bytes = simple_docx(r#"<w:p><w:r><w:t>Hello</w:t></w:r></w:p>"#);
    let mut docx = open_docx_bytes(&bytes).unwrap();
    let doc = docx.document_mut();
    let id = doc.next_free_id();
    let para = &mut doc.paragraphs[0];
    para.inlines.insert(0, Inline::CommentRangeStart(id));
    para.inlines.push(Inline::CommentRangeEnd(id));
    para.inlines.push(Inline::Run(Run::new(
        RunContent::CommentReference(id),
        RunProperties::new().with_character_style("CommentReference"),
    )));
    doc.add_comment(Comment::new(
        id,
        "Reviewer",
        "R",
        "2024-01-15T10:30:00Z",
        vec![vec![StyledText::plain("Looks good")]],
    ));

    let saved = docx.to_bytes().unwrap();
    let comments = read_part(&saved, "word/comments.xml").unwrap();
    assert!(comments.contains(r#"<w:comment w:id="0" w:author="Reviewer""#));
    assert!(comments.contains("Looks good"));

    let rels = read_part(&saved, "word/_rels/document.xml.rels").unwrap();
    assert!(rels.contains(r#"Id="rId2""#));
    assert!(rels.contains(r#"Target="comments.xml""#));

    let types = read_part(&saved, "[Content_Types].xml").unwrap();
    assert!(types.contains(r#"PartName="/word/comments.xml""#));

    let document = read_part(&saved, "word/document.xml").unwrap();
    assert!(document.contains(r#"<w:commentRangeStart w:id="0"/>"#));
    assert!(document.contains(r#"<w:commentReference w:id="0"/>"#));

    let reopened = open_docx_bytes(&saved).unwrap();
    assert_eq!(reopened.document().comments.len(), 1);
    assert_eq!(reopened.document().next_free_id(), 1);
}

#[test]
fn test_existing_comments_are_kept_and_ids_continue() {
    let document = document_xml(
        r#"<w:p><w:commentRangeStart w:id="5"/><w:r><w:t>Text</w:t></w:r><w:commentRangeEnd w:id="5"/><w:r><w:commentReference w:id="5"/></w:r></w:p>"#,
    );
    let comments = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:comment w:id="5" w:author="Old"><w:p><w:r><w:t>Earlier note</w:t></w:r></w:p></w:comment></w:comments>"#;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="comments.xml"/></Relationships>"#;
    let bytes = build_docx(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", &document),
        ("word/_rels/document.xml.rels", rels),
        ("word/comments.xml", comments),
    ]);

    let mut docx = open_docx_bytes(&bytes).unwrap();
    assert_eq!(docx.document().comments.len(), 1);
    assert_eq!(docx.document().next_free_id(), 6);

    let id = docx.document().next_free_id();
    docx.document_mut().add_comment(Comment::new(
        id,
        "New",
        "N",
        "2024-01-15T10:30:00Z",
        vec![vec![StyledText::plain("Later note")]],
    ));
    let saved = docx.to_bytes().unwrap();

    let written = read_part(&saved, "word/comments.xml").unwrap();
    let old = written.find("Earlier note").unwrap();
    let new = written.find("Later note").unwrap();
    assert!(old < new);
    assert_eq!(read_part(&saved, "word/_rels/document.xml.rels").unwrap(), rels);
}

#[test]
fn test_open_and_save_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out/annotated.docx");
    std::fs::write(&input, simple_docx(r#"<w:p><w:r><w:t>Disk</w:t></w:r></w:p>"#)).unwrap();

    let docx = open_docx(&input).unwrap();
    docx.save(&output).unwrap();
    let reopened = open_docx(&output).unwrap();
    assert_eq!(reopened.document().paragraphs[0].logical_text(), "Disk");
}

#[test]
fn test_missing_file_and_missing_parts() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(open_docx(&dir.path().join("nope.docx")), Err(DocxError::Io(_))));

    let bytes = build_docx(&[("[Content_Types].xml", CONTENT_TYPES)]);
    assert!(matches!(open_docx_bytes(&bytes), Err(DocxError::MissingPart(_))));
}
