//! Document Model - paragraphs, runs, revision marks and comments
//!
//! This crate provides the in-memory model the annotation engine mutates:
//! an ordered list of paragraphs whose runs carry formatting, hyperlink and
//! tracked-change context, plus the document's comment collection.

mod document;
mod paragraph;
mod run;
mod comment;
mod error;

pub use document::*;
pub use paragraph::*;
pub use run::*;
pub use comment::*;
pub use error::*;
