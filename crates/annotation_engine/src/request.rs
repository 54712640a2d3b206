//! Annotation requests
//!
//! A request pairs a locator (what text to target) with an action (what to do
//! there). Requests arrive as flat JSON objects; `RequestWire` is that flat
//! shape and every conversion into `AnnotationRequest` goes through the same
//! validation.

use crate::{AnnotationError, Result};
use serde::{Deserialize, Serialize};

/// Where inserted text goes relative to the anchor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Before,
    #[default]
    After,
}

impl InsertPosition {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(InsertPosition::Before),
            "after" => Ok(InsertPosition::After),
            other => Err(AnnotationError::Malformed(format!(
                "position must be \"before\" or \"after\", got {:?}",
                other
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            InsertPosition::Before => "before",
            InsertPosition::After => "after",
        }
    }
}

/// How a request identifies its target span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A literal passage, resolved through the matching strategies
    Text {
        find: String,
        /// 1-based
        occurrence: usize,
        /// Only matches starting in this paragraph count
        paragraph_hint: Option<usize>,
    },
    /// A whole paragraph, or one sentence of it
    Position {
        paragraph: usize,
        sentence: Option<usize>,
    },
}

impl Locator {
    /// First occurrence of a passage
    pub fn text(find: impl Into<String>) -> Self {
        Self::nth(find, 1)
    }

    pub fn nth(find: impl Into<String>, occurrence: usize) -> Self {
        Locator::Text {
            find: find.into(),
            occurrence,
            paragraph_hint: None,
        }
    }

    pub fn paragraph(index: usize) -> Self {
        Locator::Position {
            paragraph: index,
            sentence: None,
        }
    }

    pub fn sentence(paragraph: usize, sentence: usize) -> Self {
        Locator::Position {
            paragraph,
            sentence: Some(sentence),
        }
    }
}

/// The mutation a request performs; all texts may carry inline markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Comment { body: String },
    Replace { replacement: String },
    Delete,
    Insert { text: String, position: InsertPosition },
}

impl Action {
    pub fn kind(&self) -> RequestKind {
        match self {
            Action::Comment { .. } => RequestKind::Comment,
            Action::Replace { .. } => RequestKind::Replace,
            Action::Delete => RequestKind::Delete,
            Action::Insert { .. } => RequestKind::Insert,
        }
    }
}

/// Request type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Comment,
    Replace,
    Delete,
    Insert,
}

impl RequestKind {
    /// Parse a type tag, ignoring case
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "comment" => Some(RequestKind::Comment),
            "replace" => Some(RequestKind::Replace),
            "delete" => Some(RequestKind::Delete),
            "insert" => Some(RequestKind::Insert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Comment => "Comment",
            RequestKind::Replace => "Replace",
            RequestKind::Delete => "Delete",
            RequestKind::Insert => "Insert",
        }
    }
}

/// A validated annotation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequestWire", into = "RequestWire")]
pub struct AnnotationRequest {
    pub locator: Locator,
    pub action: Action,
}

impl AnnotationRequest {
    pub fn new(locator: Locator, action: Action) -> Self {
        Self { locator, action }
    }

    pub fn comment(locator: Locator, body: impl Into<String>) -> Self {
        Self::new(locator, Action::Comment { body: body.into() })
    }

    pub fn replace(locator: Locator, replacement: impl Into<String>) -> Self {
        Self::new(
            locator,
            Action::Replace {
                replacement: replacement.into(),
            },
        )
    }

    pub fn delete(locator: Locator) -> Self {
        Self::new(locator, Action::Delete)
    }

    pub fn insert(locator: Locator, text: impl Into<String>, position: InsertPosition) -> Self {
        Self::new(
            locator,
            Action::Insert {
                text: text.into(),
                position,
            },
        )
    }

    pub fn kind(&self) -> RequestKind {
        self.action.kind()
    }
}

/// Flat JSON shape of a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWire {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl RequestWire {
    /// The request's type tag, if it names a known type
    pub fn request_kind(&self) -> Option<RequestKind> {
        RequestKind::parse(&self.kind)
    }

    fn locator(&self) -> Result<Locator> {
        let paragraph = match self.paragraph_index {
            Some(index) if index < 0 => {
                return Err(AnnotationError::Malformed(format!(
                    "paragraphIndex must not be negative, got {}",
                    index
                )))
            }
            Some(index) => Some(index as usize),
            None => None,
        };

        if let Some(find) = &self.find {
            if find.trim().is_empty() {
                return Err(AnnotationError::Malformed("find must not be empty".into()));
            }
            let occurrence = match self.occurrence {
                None => 1,
                Some(n) if n >= 1 => n as usize,
                Some(n) => {
                    return Err(AnnotationError::Malformed(format!(
                        "occurrence is 1-based, got {}",
                        n
                    )))
                }
            };
            return Ok(Locator::Text {
                find: find.clone(),
                occurrence,
                paragraph_hint: paragraph,
            });
        }

        let Some(paragraph) = paragraph else {
            return Err(AnnotationError::Malformed(
                "request needs either find or paragraphIndex".into(),
            ));
        };
        let sentence = match self.sentence_index {
            None | Some(-1) => None,
            Some(index) if index < -1 => {
                return Err(AnnotationError::Malformed(format!(
                    "sentenceIndex must be -1 or greater, got {}",
                    index
                )))
            }
            Some(index) => Some(index as usize),
        };
        Ok(Locator::Position {
            paragraph,
            sentence,
        })
    }

    fn action(&self) -> Result<Action> {
        let kind = self.request_kind().ok_or_else(|| {
            AnnotationError::Malformed(format!("unknown request type {:?}", self.kind))
        })?;
        let required = |value: &Option<String>, field: &str| -> Result<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.clone()),
                _ => Err(AnnotationError::Malformed(format!(
                    "{} request requires a non-empty {:?}",
                    kind.as_str(),
                    field
                ))),
            }
        };
        Ok(match kind {
            RequestKind::Comment => Action::Comment {
                body: required(&self.comment, "comment")?,
            },
            RequestKind::Replace => Action::Replace {
                replacement: required(&self.replacement, "replacement")?,
            },
            RequestKind::Delete => Action::Delete,
            RequestKind::Insert => Action::Insert {
                text: required(&self.text, "text")?,
                position: match &self.position {
                    Some(p) => InsertPosition::parse(p)?,
                    None => InsertPosition::default(),
                },
            },
        })
    }
}

impl TryFrom<RequestWire> for AnnotationRequest {
    type Error = AnnotationError;

    fn try_from(wire: RequestWire) -> Result<Self> {
        let action = wire.action()?;
        let locator = wire.locator()?;
        Ok(AnnotationRequest { locator, action })
    }
}

impl From<AnnotationRequest> for RequestWire {
    fn from(request: AnnotationRequest) -> Self {
        let mut wire = RequestWire {
            kind: request.kind().as_str().to_string(),
            ..Default::default()
        };
        match request.locator {
            Locator::Text {
                find,
                occurrence,
                paragraph_hint,
            } => {
                wire.find = Some(find);
                wire.occurrence = Some(occurrence as i64);
                wire.paragraph_index = paragraph_hint.map(|p| p as i64);
            }
            Locator::Position {
                paragraph,
                sentence,
            } => {
                wire.paragraph_index = Some(paragraph as i64);
                wire.sentence_index = sentence.map(|s| s as i64);
            }
        }
        match request.action {
            Action::Comment { body } => wire.comment = Some(body),
            Action::Replace { replacement } => wire.replacement = Some(replacement),
            Action::Delete => {}
            Action::Insert { text, position } => {
                wire.text = Some(text);
                wire.position = Some(position.as_str().to_string());
            }
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> std::result::Result<AnnotationRequest, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    #[test]
    fn test_comment_request() {
        let request = parse(json!({"type": "Comment", "find": "revenue", "comment": "Source?"})).unwrap();
        assert_eq!(request.locator, Locator::text("revenue"));
        assert_eq!(request.action, Action::Comment { body: "Source?".into() });
        assert_eq!(request.kind(), RequestKind::Comment);
    }

    #[test]
    fn test_type_is_case_insensitive() {
        let request = parse(json!({"type": "delete", "find": "x", "occurrence": 2})).unwrap();
        assert_eq!(request.locator, Locator::nth("x", 2));
        assert_eq!(request.action, Action::Delete);
    }

    #[test]
    fn test_insert_position_defaults_to_after() {
        let request = parse(json!({"type": "Insert", "find": "x", "text": "y"})).unwrap();
        assert_eq!(
            request.action,
            Action::Insert { text: "y".into(), position: InsertPosition::After }
        );
        let request = parse(json!({"type": "Insert", "find": "x", "text": "y", "position": "Before"})).unwrap();
        assert!(matches!(request.action, Action::Insert { position: InsertPosition::Before, .. }));
    }

    #[test]
    fn test_position_locator() {
        let request = parse(json!({"type": "Comment", "paragraphIndex": 3, "sentenceIndex": -1, "comment": "c"})).unwrap();
        assert_eq!(request.locator, Locator::paragraph(3));
        let request = parse(json!({"type": "Comment", "paragraphIndex": 3, "sentenceIndex": 1, "comment": "c"})).unwrap();
        assert_eq!(request.locator, Locator::sentence(3, 1));
    }

    #[test]
    fn test_find_with_paragraph_hint() {
        let request = parse(json!({"type": "Delete", "find": "x", "paragraphIndex": 2})).unwrap();
        assert_eq!(
            request.locator,
            Locator::Text { find: "x".into(), occurrence: 1, paragraph_hint: Some(2) }
        );
    }

    #[test]
    fn test_malformed_requests() {
        let cases = [
            json!({"type": "Annotate", "find": "x"}),
            json!({"type": "Comment", "find": "x"}),
            json!({"type": "Replace", "find": "x"}),
            json!({"type": "Insert", "find": "x", "text": ""}),
            json!({"type": "Insert", "find": "x", "text": "y", "position": "inside"}),
            json!({"type": "Delete", "find": "   "}),
            json!({"type": "Delete", "find": "x", "occurrence": 0}),
            json!({"type": "Delete"}),
            json!({"type": "Delete", "paragraphIndex": -1}),
            json!({"type": "Delete", "paragraphIndex": 0, "sentenceIndex": -2}),
            json!({"find": "x"}),
        ];
        for case in cases {
            assert!(parse(case.clone()).is_err(), "accepted {}", case);
        }
    }

    #[test]
    fn test_wire_round_trip() {
        let request = AnnotationRequest::insert(Locator::nth("x", 2), "**y**", InsertPosition::Before);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "Insert");
        assert_eq!(value["position"], "before");
        assert_eq!(parse(value).unwrap(), request);
    }
}
