//! Batch coordination
//!
//! A batch resolves and applies its requests strictly in order against one
//! document. Each request sees the document as left by the requests before
//! it, minus text those requests inserted. Failures never stop the batch;
//! whether a document is returned when something failed is decided by the
//! configured `AtomicityPolicy`.

use crate::anchor::{AnchorResolver, ClosestMatch, MatchStrategy};
use crate::attribution::{Attribution, Author};
use crate::mutation::MutationApplier;
use crate::request::RequestWire;
use crate::text_view::LogicalTextView;
use crate::{AnnotationError, AnnotationRequest, AtomicityPolicy, EngineConfig, EngineError, RequestKind};
use chrono::{DateTime, Utc};
use doc_model::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use store::open_docx_bytes;
use uuid::Uuid;

/// Identifier of one batch, for logs and results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a single request ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    #[serde(rename_all = "camelCase")]
    Applied {
        strategy: MatchStrategy,
        matched: String,
        start_paragraph: usize,
        end_paragraph: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        comment_id: Option<u32>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        revision_ids: Vec<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        reason: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        closest_matches: Vec<ClosestMatch>,
        #[serde(skip)]
        error: AnnotationError,
    },
}

/// Result of one request, in request order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationResult {
    pub index: usize,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RequestKind>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl AnnotationResult {
    fn failed(
        index: usize,
        kind: Option<RequestKind>,
        error: AnnotationError,
        closest_matches: Vec<ClosestMatch>,
    ) -> Self {
        Self {
            index,
            kind,
            outcome: Outcome::Failed {
                reason: error.reason(),
                message: error.to_string(),
                closest_matches,
                error,
            },
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied { .. })
    }

    pub fn error(&self) -> Option<&AnnotationError> {
        match &self.outcome {
            Outcome::Failed { error, .. } => Some(error),
            Outcome::Applied { .. } => None,
        }
    }

    pub fn closest_matches(&self) -> &[ClosestMatch] {
        match &self.outcome {
            Outcome::Failed { closest_matches, .. } => closest_matches,
            Outcome::Applied { .. } => &[],
        }
    }
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub batch_id: BatchId,
    /// Whether every request applied
    pub ok: bool,
    /// The annotated package, when the atomicity policy allows one
    #[serde(skip)]
    pub document: Option<Vec<u8>>,
    pub results: Vec<AnnotationResult>,
}

impl BatchResult {
    pub fn failures(&self) -> impl Iterator<Item = &AnnotationResult> {
        self.results.iter().filter(|r| !r.is_applied())
    }

    pub fn applied_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_applied()).count()
    }
}

/// A request as received: decoded, or the reason it could not be
enum Entry {
    Valid(AnnotationRequest),
    Invalid {
        kind: Option<RequestKind>,
        error: AnnotationError,
    },
}

impl Entry {
    fn decode(value: &serde_json::Value) -> Self {
        let wire: RequestWire = match serde_json::from_value(value.clone()) {
            Ok(wire) => wire,
            Err(e) => {
                return Entry::Invalid {
                    kind: value
                        .get("type")
                        .and_then(|t| t.as_str())
                        .and_then(RequestKind::parse),
                    error: AnnotationError::Malformed(e.to_string()),
                }
            }
        };
        let kind = wire.request_kind();
        match AnnotationRequest::try_from(wire) {
            Ok(request) => Entry::Valid(request),
            Err(error) => Entry::Invalid { kind, error },
        }
    }
}

/// Annotates DOCX packages
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    config: EngineConfig,
}

impl Annotator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply validated requests to a package
    pub fn annotate(
        &self,
        bytes: &[u8],
        requests: &[AnnotationRequest],
        author: &Author,
    ) -> Result<BatchResult, EngineError> {
        self.annotate_at(bytes, requests, author, Utc::now())
    }

    /// Same as `annotate`, with a fixed timestamp for every annotation
    pub fn annotate_at(
        &self,
        bytes: &[u8],
        requests: &[AnnotationRequest],
        author: &Author,
        timestamp: DateTime<Utc>,
    ) -> Result<BatchResult, EngineError> {
        let entries = requests.iter().cloned().map(Entry::Valid).collect();
        self.run(bytes, entries, author, timestamp)
    }

    /// Apply raw JSON requests; a request that does not decode becomes a
    /// failed result at its index instead of failing the batch
    pub fn annotate_values(
        &self,
        bytes: &[u8],
        requests: &[serde_json::Value],
        author: &Author,
    ) -> Result<BatchResult, EngineError> {
        let entries = requests.iter().map(Entry::decode).collect();
        self.run(bytes, entries, author, Utc::now())
    }

    /// Apply requests to an in-memory document
    pub fn annotate_document(
        &self,
        document: &mut Document,
        requests: &[AnnotationRequest],
        attribution: &mut Attribution,
    ) -> Vec<AnnotationResult> {
        requests
            .iter()
            .enumerate()
            .map(|(index, request)| self.apply_one(document, index, request, attribution))
            .collect()
    }

    fn run(
        &self,
        bytes: &[u8],
        entries: Vec<Entry>,
        author: &Author,
        timestamp: DateTime<Utc>,
    ) -> Result<BatchResult, EngineError> {
        let batch_id = BatchId::new();
        let span = tracing::info_span!("annotate_batch", batch_id = %batch_id, requests = entries.len());
        let _guard = span.enter();

        let mut docx = open_docx_bytes(bytes)?;
        let first_id = docx.document().next_free_id();
        let mut attribution = Attribution::new(author.clone(), timestamp, first_id);

        let results: Vec<AnnotationResult> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                Entry::Valid(request) => {
                    self.apply_one(docx.document_mut(), index, &request, &mut attribution)
                }
                Entry::Invalid { kind, error } => {
                    tracing::warn!(index, "Rejected malformed request: {}", error);
                    AnnotationResult::failed(index, kind, error, Vec::new())
                }
            })
            .collect();

        let ok = results.iter().all(AnnotationResult::is_applied);
        let document = if ok || self.config.atomicity == AtomicityPolicy::Partial {
            Some(docx.to_bytes()?)
        } else {
            None
        };
        tracing::info!(
            ok,
            applied = results.iter().filter(|r| r.is_applied()).count(),
            failed = results.iter().filter(|r| !r.is_applied()).count(),
            "Batch finished"
        );

        Ok(BatchResult {
            batch_id,
            ok,
            document,
            results,
        })
    }

    fn apply_one(
        &self,
        document: &mut Document,
        index: usize,
        request: &AnnotationRequest,
        attribution: &mut Attribution,
    ) -> AnnotationResult {
        let kind = Some(request.kind());
        let view = LogicalTextView::extract(document);
        let span = match AnchorResolver::new(&view, &self.config).resolve(&request.locator) {
            Ok(span) => span,
            Err(failure) => {
                tracing::warn!(index, "Could not resolve request: {}", failure.error);
                return AnnotationResult::failed(index, kind, failure.error, failure.closest_matches);
            }
        };

        match MutationApplier::apply(document, &span, &request.action, attribution) {
            Ok(applied) => {
                tracing::debug!(index, strategy = ?span.strategy, "Applied {:?}", request.kind());
                AnnotationResult {
                    index,
                    kind,
                    outcome: Outcome::Applied {
                        strategy: span.strategy,
                        matched: span.matched,
                        start_paragraph: span.start.paragraph,
                        end_paragraph: span.end.paragraph,
                        comment_id: applied.comment_id,
                        revision_ids: applied.revision_ids,
                    },
                }
            }
            Err(error) => {
                tracing::warn!(index, "Could not apply request: {}", error);
                AnnotationResult::failed(index, kind, error, Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Locator};
    use chrono::TimeZone;

    fn attribution() -> Attribution {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        Attribution::new(Author::default(), at, 0)
    }

    #[test]
    fn test_requests_run_in_order_against_original_text() {
        let mut doc = Document::from_texts(["alpha beta gamma"]);
        let requests = vec![
            AnnotationRequest::insert(Locator::text("alpha"), " beta", crate::InsertPosition::After),
            AnnotationRequest::delete(Locator::nth("beta", 1)),
        ];
        let results = Annotator::default().annotate_document(&mut doc, &requests, &mut attribution());
        assert!(results.iter().all(AnnotationResult::is_applied));
        // The inserted " beta" is not visible, so the original "beta" is deleted
        let Outcome::Applied { matched, .. } = &results[1].outcome else { panic!() };
        assert_eq!(matched, "beta");
        assert_eq!(doc.paragraphs[0].logical_text(), "alpha beta gamma");
    }

    #[test]
    fn test_failure_is_reported_with_index() {
        let mut doc = Document::from_texts(["text"]);
        let requests = vec![
            AnnotationRequest::comment(Locator::text("text"), "ok"),
            AnnotationRequest::new(Locator::paragraph(4), Action::Delete),
        ];
        let results = Annotator::default().annotate_document(&mut doc, &requests, &mut attribution());
        assert!(results[0].is_applied());
        assert_eq!(results[1].index, 1);
        assert_eq!(
            results[1].error(),
            Some(&AnnotationError::ParagraphOutOfRange { index: 4, count: 1 })
        );
    }

    #[test]
    fn test_result_serialization() {
        let mut doc = Document::from_texts(["find me"]);
        let requests = vec![
            AnnotationRequest::comment(Locator::text("me"), "note"),
            AnnotationRequest::comment(Locator::text("find you"), "note"),
        ];
        let results = Annotator::default().annotate_document(&mut doc, &requests, &mut attribution());
        let applied = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(applied["status"], "applied");
        assert_eq!(applied["type"], "Comment");
        assert_eq!(applied["strategy"], "exact");
        assert_eq!(applied["commentId"], 0);
        assert_eq!(applied["startParagraph"], 0);

        let failed = serde_json::to_value(&results[1]).unwrap();
        assert_eq!(failed["status"], "failed");
        assert_eq!(failed["reason"], "textNotFound");
        assert_eq!(failed["closestMatches"][0]["paragraphIndex"], 0);
        assert!(failed.get("error").is_none());
    }

    #[test]
    fn test_decode_reports_kind() {
        let Entry::Invalid { kind, error } = Entry::decode(&serde_json::json!({"type": "insert", "find": "x"})) else {
            panic!("expected a rejected request");
        };
        assert_eq!(kind, Some(RequestKind::Insert));
        assert!(matches!(error, AnnotationError::Malformed(_)));

        let Entry::Invalid { kind, .. } = Entry::decode(&serde_json::json!({"find": 3})) else {
            panic!("expected a rejected request");
        };
        assert_eq!(kind, None);
    }

    #[test]
    fn test_batch_ids_are_unique() {
        assert_ne!(BatchId::new(), BatchId::new());
    }
}
