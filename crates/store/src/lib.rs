//! Store - DOCX package persistence
//!
//! This crate reads DOCX packages into the document model, writes the model
//! back, and keeps every part it does not interpret byte-for-byte intact.

pub mod docx;

pub use docx::{open_docx, open_docx_bytes, DocxDocument, DocxError, DocxResult};
