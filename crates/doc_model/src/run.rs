//! Text run - a contiguous span of content with consistent formatting
//!
//! A run carries exactly one content item. Runs read from a document that held
//! several items (`<w:t>`, `<w:tab/>`, `<w:br/>` ...) are loaded as a sequence of
//! single-item runs that share the same formatting, which keeps splitting and
//! revision marking at the granularity of one item.

use crate::{DocModelError, Result};
use serde::{Deserialize, Serialize};

/// Character styling flags that survive a round trip through the annotation
/// pipeline (markdown bodies and run overlays)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
}

impl TextStyle {
    /// Plain text, no flags set
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        Self { bold: true, ..Self::default() }
    }

    pub fn italic() -> Self {
        Self { italic: true, ..Self::default() }
    }

    pub fn bold_italic() -> Self {
        Self { bold: true, italic: true, ..Self::default() }
    }

    pub fn strike() -> Self {
        Self { strike: true, ..Self::default() }
    }

    /// Whether no flag is set
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A fragment of text with a single style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledText {
    pub text: String,
    pub style: TextStyle,
}

impl StyledText {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self { text: text.into(), style }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::plain())
    }
}

/// Child element order of `w:rPr` (ECMA-376 CT_RPr sequence)
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect",
    "bdr", "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout",
    "specVanish", "oMath", "rPrChange",
];

fn schema_rank(name: &str) -> usize {
    RPR_ORDER
        .iter()
        .position(|n| *n == name)
        .unwrap_or(RPR_ORDER.len() - 1)
}

/// One child element of a run's property block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyElement {
    /// Local element name (e.g. `b`, `sz`, `rFonts`)
    pub name: String,
    /// Value of the `w:val` attribute, if present
    pub value: Option<String>,
    /// The element serialized verbatim
    pub xml: String,
}

impl PropertyElement {
    pub fn new(name: impl Into<String>, value: Option<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            xml: xml.into(),
        }
    }

    /// A toggle property (`<w:b/>`, `<w:i/>` ...) switched on
    fn toggle(name: &str) -> Self {
        Self::new(name, None, format!("<w:{}/>", name))
    }

    fn is_on(&self) -> bool {
        match self.value.as_deref() {
            None => true,
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "none"),
        }
    }
}

/// Formatting descriptor of a run
///
/// Elements are kept verbatim so that fonts, sizes, colours and anything else
/// the engine does not interpret are preserved when a run is split or its
/// formatting is inherited by inserted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProperties {
    elements: Vec<PropertyElement>,
}

impl RunProperties {
    /// Empty formatting (inherits everything from the paragraph style)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed `w:rPr` children, in document order
    pub fn from_elements(elements: Vec<PropertyElement>) -> Self {
        Self { elements }
    }

    /// Formatting derived from style flags only
    pub fn from_style(style: TextStyle) -> Self {
        Self::new().overlay(style)
    }

    pub fn elements(&self) -> &[PropertyElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// The style flags this formatting switches on
    pub fn style(&self) -> TextStyle {
        let on = |name: &str| self.get(name).map(|e| e.is_on()).unwrap_or(false);
        TextStyle {
            bold: on("b"),
            italic: on("i"),
            underline: on("u"),
            strike: on("strike"),
        }
    }

    /// Insert or replace an element, keeping schema order
    pub fn set(&mut self, element: PropertyElement) {
        if let Some(existing) = self.elements.iter_mut().find(|e| e.name == element.name) {
            *existing = element;
            return;
        }
        let rank = schema_rank(&element.name);
        let at = self
            .elements
            .iter()
            .position(|e| schema_rank(&e.name) > rank)
            .unwrap_or(self.elements.len());
        self.elements.insert(at, element);
    }

    /// Remove an element by local name
    pub fn remove(&mut self, name: &str) {
        self.elements.retain(|e| e.name != name);
    }

    /// Copy of these properties with the given flags switched on
    ///
    /// Flags that are off in `style` leave the inherited value untouched.
    pub fn overlay(&self, style: TextStyle) -> Self {
        let mut props = self.clone();
        // Revision history of the source run does not apply to new content
        props.remove("rPrChange");
        if style.bold {
            props.set(PropertyElement::toggle("b"));
        }
        if style.italic {
            props.set(PropertyElement::toggle("i"));
        }
        if style.strike {
            props.set(PropertyElement::toggle("strike"));
        }
        if style.underline {
            props.set(PropertyElement::new(
                "u",
                Some("single".to_string()),
                r#"<w:u w:val="single"/>"#,
            ));
        }
        props
    }

    /// Set the character style reference (`w:rStyle`)
    pub fn with_character_style(mut self, style_id: &str) -> Self {
        self.set(PropertyElement::new(
            "rStyle",
            Some(style_id.to_string()),
            format!(r#"<w:rStyle w:val="{}"/>"#, style_id),
        ));
        self
    }

    /// Serialize as a `w:rPr` element (empty string when there is nothing to write)
    pub fn to_xml(&self) -> String {
        if self.elements.is_empty() {
            return String::new();
        }
        let mut xml = String::from("<w:rPr>");
        for element in &self.elements {
            xml.push_str(&element.xml);
        }
        xml.push_str("</w:rPr>");
        xml
    }
}

/// The single content item of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunContent {
    /// Text (`w:t`, or `w:delText` inside a deletion)
    Text(String),
    /// Tab character
    Tab,
    /// Line break; carries the source element when it had attributes (page breaks)
    Break(Option<String>),
    /// Reference mark of a comment
    CommentReference(u32),
    /// Any other run child (drawings, field characters ...), kept verbatim
    Other(String),
}

impl RunContent {
    /// Text contributed to the logical text view
    pub fn logical_text(&self) -> &str {
        match self {
            RunContent::Text(t) => t,
            RunContent::Tab => "\t",
            RunContent::Break(_) => "\n",
            RunContent::CommentReference(_) | RunContent::Other(_) => "",
        }
    }

    /// Length of the logical text in characters
    pub fn char_len(&self) -> usize {
        match self {
            RunContent::Text(t) => t.chars().count(),
            RunContent::Tab | RunContent::Break(_) => 1,
            RunContent::CommentReference(_) | RunContent::Other(_) => 0,
        }
    }
}

/// Where a revision mark came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkOrigin {
    /// Read from the source document; the start tag is written back verbatim
    Source { open: String },
    /// Created by the current annotation batch
    Batch,
}

/// Attribution of a tracked insertion or deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMark {
    pub id: u32,
    pub author: String,
    /// ISO 8601 timestamp
    pub date: Option<String>,
    pub origin: MarkOrigin,
}

impl RevisionMark {
    /// A mark created by the current batch
    pub fn new(id: u32, author: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id,
            author: author.into(),
            date: Some(date.into()),
            origin: MarkOrigin::Batch,
        }
    }

    pub fn is_from_batch(&self) -> bool {
        matches!(self.origin, MarkOrigin::Batch)
    }
}

/// Tracked-change state of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRevision {
    pub inserted: Option<RevisionMark>,
    pub deleted: Option<RevisionMark>,
}

impl RunRevision {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

/// Hyperlink a run belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Start tag content of the source `w:hyperlink`, without angle brackets
    pub open: String,
    /// Distinguishes adjacent hyperlinks with identical attributes
    pub group: u32,
}

/// A text run - one content item with its formatting and context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Start tag content of the source `w:r` (keeps rsid attributes)
    pub open: Option<String>,
    pub properties: RunProperties,
    pub content: RunContent,
    pub hyperlink: Option<Hyperlink>,
    pub revision: RunRevision,
}

impl Run {
    pub fn new(content: RunContent, properties: RunProperties) -> Self {
        Self {
            open: None,
            properties,
            content,
            hyperlink: None,
            revision: RunRevision::none(),
        }
    }

    /// A plain text run
    pub fn text(text: impl Into<String>, properties: RunProperties) -> Self {
        Self::new(RunContent::Text(text.into()), properties)
    }

    /// Whether the run contributes to the logical text used for anchoring
    ///
    /// Content inserted by the current batch is excluded so that later
    /// requests resolve against the text the batch started with.
    pub fn is_anchorable(&self) -> bool {
        !self
            .revision
            .inserted
            .as_ref()
            .map(RevisionMark::is_from_batch)
            .unwrap_or(false)
    }

    /// Logical length of the run in characters (0 when not anchorable)
    pub fn anchor_len(&self) -> usize {
        if self.is_anchorable() {
            self.content.char_len()
        } else {
            0
        }
    }

    /// Split a text run at a character offset into two runs that share all
    /// formatting and context
    pub fn split_at(&self, offset: usize) -> Result<(Run, Run)> {
        let RunContent::Text(text) = &self.content else {
            return Err(DocModelError::NotSplittable(offset));
        };
        let len = text.chars().count();
        if offset == 0 || offset >= len {
            return Err(DocModelError::InvalidOffset { offset, len });
        }
        let byte = text
            .char_indices()
            .nth(offset)
            .map(|(b, _)| b)
            .unwrap_or(text.len());
        let mut left = self.clone();
        let mut right = self.clone();
        left.content = RunContent::Text(text[..byte].to_string());
        right.content = RunContent::Text(text[byte..].to_string());
        Ok((left, right))
    }
}
