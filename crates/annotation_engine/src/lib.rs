//! Annotation Engine - anchoring, comments and tracked changes
//!
//! This crate resolves annotation requests against the logical text of a
//! document and applies them as review comments or tracked changes.
//! Resolution runs a ladder of matching strategies (exact, normalized,
//! dehyphenated, case-insensitive, cross-paragraph) and reports closest
//! matches when nothing fits.

mod error;
mod config;
mod request;
mod sentence;
mod normalize;
mod text_view;
mod anchor;
mod markdown;
mod attribution;
mod mutation;
mod batch;

pub use error::*;
pub use config::*;
pub use request::*;
pub use sentence::sentence_spans;
pub use normalize::{find_all, Folded};
pub use text_view::*;
pub use anchor::*;
pub use markdown::{plain_text, render as render_markdown};
pub use attribution::*;
pub use mutation::*;
pub use batch::*;
