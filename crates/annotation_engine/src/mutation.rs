//! Applying a resolved span's action to the document
//!
//! Every action first splits the runs at the span boundaries so the span
//! covers whole runs, then works on inline indices. A failed action restores
//! the paragraphs it touched and the id allocator, so the document is left
//! exactly as it was.

use crate::anchor::ResolvedSpan;
use crate::attribution::Attribution;
use crate::markdown;
use crate::{Action, AnnotationError, InsertPosition, Result};
use doc_model::{
    Comment, Document, Inline, Paragraph, RevisionMark, Run, RunContent, RunProperties,
};
use serde::{Deserialize, Serialize};

/// What an applied action created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applied {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub revision_ids: Vec<u32>,
}

/// The part of one paragraph a span covers
#[derive(Debug, Clone, Copy)]
struct Stretch {
    paragraph: usize,
    from: usize,
    to: usize,
}

pub struct MutationApplier;

impl MutationApplier {
    /// Apply an action over a resolved span
    pub fn apply(
        document: &mut Document,
        span: &ResolvedSpan,
        action: &Action,
        attribution: &mut Attribution,
    ) -> Result<Applied> {
        let first = span.start.paragraph;
        let last = span.end.paragraph;
        let snapshot: Vec<Paragraph> = document
            .paragraphs
            .get(first..=last)
            .map(<[Paragraph]>::to_vec)
            .ok_or(AnnotationError::ParagraphOutOfRange {
                index: last,
                count: document.paragraph_count(),
            })?;
        let ids = attribution.clone();

        match Self::apply_action(document, span, action, attribution) {
            Ok(applied) => {
                for id in applied.comment_id.iter().chain(&applied.revision_ids) {
                    document.note_id(*id);
                }
                Ok(applied)
            }
            Err(e) => {
                document.paragraphs.splice(first..=last, snapshot);
                *attribution = ids;
                Err(e)
            }
        }
    }

    fn apply_action(
        document: &mut Document,
        span: &ResolvedSpan,
        action: &Action,
        attribution: &mut Attribution,
    ) -> Result<Applied> {
        let stretches = Self::split_boundaries(document, span)?;
        match action {
            Action::Comment { body } => Self::comment(document, span, body, attribution),
            Action::Delete => {
                if span.is_empty() {
                    return Err(AnnotationError::EmptySpan("delete"));
                }
                let revision_ids = Self::delete(document, &stretches, attribution)?;
                Ok(Applied {
                    comment_id: None,
                    revision_ids,
                })
            }
            Action::Insert { text, position } => {
                let id = Self::insert(document, span, text, *position, attribution)?;
                Ok(Applied {
                    comment_id: None,
                    revision_ids: vec![id],
                })
            }
            Action::Replace { replacement } => {
                if span.is_empty() {
                    return Err(AnnotationError::EmptySpan("replace"));
                }
                let mut revision_ids = Self::delete(document, &stretches, attribution)?;
                revision_ids.push(Self::insert(
                    document,
                    span,
                    replacement,
                    InsertPosition::After,
                    attribution,
                )?);
                Ok(Applied {
                    comment_id: None,
                    revision_ids,
                })
            }
        }
    }

    /// Put run boundaries at both ends of the span in every paragraph it covers
    fn split_boundaries(document: &mut Document, span: &ResolvedSpan) -> Result<Vec<Stretch>> {
        let mut stretches = Vec::new();
        for paragraph in span.paragraphs() {
            let para = document.paragraph_mut(paragraph)?;
            let from = if paragraph == span.start.paragraph {
                span.start.offset
            } else {
                0
            };
            let to = if paragraph == span.end.paragraph {
                span.end.offset
            } else {
                para.logical_len()
            };
            para.split_at(from)?;
            para.split_at(to)?;
            stretches.push(Stretch {
                paragraph,
                from,
                to,
            });
        }
        Ok(stretches)
    }

    fn comment(
        document: &mut Document,
        span: &ResolvedSpan,
        body: &str,
        attribution: &mut Attribution,
    ) -> Result<Applied> {
        let id = attribution.next_id();
        let start_para = span.start.paragraph;
        let end_para = span.end.paragraph;

        let start_at = document.paragraph(start_para)?.index_before(span.start.offset);
        let mut reference = Run::new(
            RunContent::CommentReference(id),
            RunProperties::new().with_character_style("CommentReference"),
        );
        reference.hyperlink = enclosing_hyperlink(document.paragraph(end_para)?, span.end.offset);
        let end_items = vec![Inline::CommentRangeEnd(id), Inline::Run(reference)];

        let end = document.paragraph_mut(end_para)?;
        let mut end_at = end.index_after(span.end.offset);
        if start_para == end_para {
            end_at = end_at.max(start_at);
        }
        end.insert_inlines(end_at, end_items);
        document
            .paragraph_mut(start_para)?
            .insert_inlines(start_at, vec![Inline::CommentRangeStart(id)]);

        let author = attribution.author();
        document.add_comment(Comment::new(
            id,
            author.name.clone(),
            author.initials.clone(),
            attribution.date(),
            markdown::render(body),
        ));
        Ok(Applied {
            comment_id: Some(id),
            revision_ids: Vec::new(),
        })
    }

    /// Mark every run of the span as deleted, one revision per paragraph
    fn delete(
        document: &mut Document,
        stretches: &[Stretch],
        attribution: &mut Attribution,
    ) -> Result<Vec<u32>> {
        for stretch in stretches {
            let para = document.paragraph(stretch.paragraph)?;
            let range = para.inline_range(stretch.from, stretch.to);
            if para
                .runs_in(range)
                .any(|r| r.anchor_len() > 0 && r.revision.is_deleted())
            {
                return Err(AnnotationError::Conflict(format!(
                    "text in paragraph {} is already deleted",
                    stretch.paragraph
                )));
            }
        }

        let mut ids = Vec::new();
        for stretch in stretches {
            if stretch.from >= stretch.to {
                continue;
            }
            let mark = attribution.revision();
            ids.push(mark.id);
            let para = document.paragraph_mut(stretch.paragraph)?;
            let range = para.inline_range(stretch.from, stretch.to);
            for run in para.runs_in_mut(range) {
                if !run.is_anchorable() || run.revision.is_deleted() {
                    continue;
                }
                if matches!(run.content, RunContent::CommentReference(_)) {
                    continue;
                }
                run.revision.deleted = Some(mark.clone());
            }
        }
        Ok(ids)
    }

    /// Insert rendered text as a tracked insertion next to the span
    fn insert(
        document: &mut Document,
        span: &ResolvedSpan,
        text: &str,
        position: InsertPosition,
        attribution: &mut Attribution,
    ) -> Result<u32> {
        let (paragraph, at, anchor) = {
            let (paragraph, offset) = match position {
                InsertPosition::Before => (span.start.paragraph, span.start.offset),
                InsertPosition::After => (span.end.paragraph, span.end.offset),
            };
            let para = document.paragraph(paragraph)?;
            let (at, anchor_offset) = match position {
                InsertPosition::Before => (para.index_before(offset), Some(offset)),
                InsertPosition::After => {
                    (past_batch_insertions(para, para.index_after(offset)), offset.checked_sub(1))
                }
            };
            let anchor = anchor_offset
                .and_then(|o| para.locate(o))
                .and_then(|(index, _)| para.inlines[index].as_run())
                .map(inherited_properties)
                .unwrap_or_default();
            (paragraph, at, anchor)
        };

        let mark = attribution.revision();
        let runs = inserted_runs(text, &anchor, &mark);
        if runs.is_empty() {
            return Err(AnnotationError::Malformed("inserted text is empty".into()));
        }
        document.paragraph_mut(paragraph)?.insert_inlines(at, runs);
        Ok(mark.id)
    }
}

/// First index at or after `at` that is not a run inserted by this batch
fn past_batch_insertions(para: &Paragraph, mut at: usize) -> usize {
    while para
        .inlines
        .get(at)
        .and_then(Inline::as_run)
        .is_some_and(|run| !run.is_anchorable())
    {
        at += 1;
    }
    at
}

/// The hyperlink both characters around `offset` belong to
fn enclosing_hyperlink(para: &Paragraph, offset: usize) -> Option<doc_model::Hyperlink> {
    let run_at = |o: usize| {
        para.locate(o)
            .and_then(|(index, _)| para.inlines[index].as_run())
    };
    let before = run_at(offset.checked_sub(1)?)?.hyperlink.as_ref()?;
    let after = run_at(offset)?.hyperlink.as_ref()?;
    (before == after).then(|| before.clone())
}

/// Formatting new text takes over from the run next to it
fn inherited_properties(run: &Run) -> RunProperties {
    let mut props = run.properties.clone();
    if run.hyperlink.is_some() {
        props.remove("rStyle");
    }
    props
}

fn inserted_runs(text: &str, base: &RunProperties, mark: &RevisionMark) -> Vec<Inline> {
    let mut runs = Vec::new();
    for (index, line) in markdown::render(text).into_iter().enumerate() {
        if index > 0 {
            runs.push(Run::new(RunContent::Break(None), base.overlay(Default::default())));
        }
        for fragment in line {
            runs.push(Run::text(fragment.text, base.overlay(fragment.style)));
        }
    }
    runs.into_iter()
        .map(|mut run| {
            run.revision.inserted = Some(mark.clone());
            Inline::Run(run)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorResolver;
    use crate::attribution::Author;
    use crate::text_view::LogicalTextView;
    use crate::{EngineConfig, Locator};
    use chrono::TimeZone;
    use doc_model::{CommentBody, PropertyElement, TextStyle};

    fn attribution() -> Attribution {
        let at = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        Attribution::new(Author::new("Reviewer", "RV"), at, 1)
    }

    fn resolve(document: &Document, locator: Locator) -> ResolvedSpan {
        let view = LogicalTextView::extract(document);
        let config = EngineConfig::default();
        AnchorResolver::new(&view, &config).resolve(&locator).unwrap()
    }

    fn apply(document: &mut Document, locator: Locator, action: Action) -> Result<Applied> {
        let span = resolve(document, locator);
        let mut attribution = attribution();
        MutationApplier::apply(document, &span, &action, &mut attribution)
    }

    fn deleted_text(para: &Paragraph) -> String {
        para.inlines
            .iter()
            .filter_map(Inline::as_run)
            .filter(|r| r.revision.is_deleted())
            .map(|r| r.content.logical_text())
            .collect()
    }

    fn inserted_text(para: &Paragraph) -> String {
        para.inlines
            .iter()
            .filter_map(Inline::as_run)
            .filter(|r| r.revision.inserted.is_some())
            .map(|r| r.content.logical_text())
            .collect()
    }

    #[test]
    fn test_comment_brackets_span() {
        let mut doc = Document::from_texts(["The quick brown fox"]);
        let applied = apply(&mut doc, Locator::text("quick"), Action::Comment { body: "**Why** quick?".into() }).unwrap();
        assert_eq!(applied.comment_id, Some(1));

        let para = &doc.paragraphs[0];
        assert_eq!(para.logical_text(), "The quick brown fox");
        assert!(matches!(para.inlines[1], Inline::CommentRangeStart(1)));
        assert_eq!(para.inlines[2].as_run().unwrap().content.logical_text(), "quick");
        assert!(matches!(para.inlines[3], Inline::CommentRangeEnd(1)));
        let reference = para.inlines[4].as_run().unwrap();
        assert_eq!(reference.content, RunContent::CommentReference(1));
        assert_eq!(reference.properties.get("rStyle").and_then(|e| e.value.as_deref()), Some("CommentReference"));

        let comment = doc.comment(1).unwrap();
        assert_eq!(comment.author, "Reviewer");
        assert_eq!(comment.initials.as_deref(), Some("RV"));
        assert_eq!(comment.date.as_deref(), Some("2024-01-15T10:30:00Z"));
        let CommentBody::Rich(paragraphs) = &comment.body else { panic!("rich body expected") };
        assert_eq!(paragraphs[0][0].style, TextStyle::bold());
        assert_eq!(doc.next_free_id(), 2);
    }

    #[test]
    fn test_comment_across_paragraphs() {
        let mut doc = Document::from_texts(["alpha beta", "gamma delta"]);
        apply(&mut doc, Locator::text("beta gamma"), Action::Comment { body: "c".into() }).unwrap();
        assert!(matches!(doc.paragraphs[0].inlines[1], Inline::CommentRangeStart(1)));
        assert!(matches!(doc.paragraphs[1].inlines[1], Inline::CommentRangeEnd(1)));
    }

    #[test]
    fn test_comment_on_empty_paragraph() {
        let mut doc = Document::from_texts(["text", ""]);
        apply(&mut doc, Locator::paragraph(1), Action::Comment { body: "empty".into() }).unwrap();
        let para = &doc.paragraphs[1];
        assert!(matches!(para.inlines[0], Inline::CommentRangeStart(1)));
        assert!(matches!(para.inlines[1], Inline::CommentRangeEnd(1)));
    }

    #[test]
    fn test_delete_keeps_text_as_deleted() {
        let mut doc = Document::from_texts(["keep remove keep"]);
        let applied = apply(&mut doc, Locator::text("remove "), Action::Delete).unwrap();
        assert_eq!(applied.revision_ids, vec![1]);
        let para = &doc.paragraphs[0];
        assert_eq!(para.logical_text(), "keep remove keep");
        assert_eq!(deleted_text(para), "remove ");
        let mark = para.inlines[1].as_run().unwrap().revision.deleted.as_ref().unwrap();
        assert_eq!(mark.author, "Reviewer");
        assert_eq!(mark.date.as_deref(), Some("2024-01-15T10:30:00Z"));
    }

    #[test]
    fn test_delete_across_paragraphs_marks_each() {
        let mut doc = Document::from_texts(["one two", "three four"]);
        let applied = apply(&mut doc, Locator::text("two three"), Action::Delete).unwrap();
        assert_eq!(applied.revision_ids, vec![1, 2]);
        assert_eq!(deleted_text(&doc.paragraphs[0]), "two");
        assert_eq!(deleted_text(&doc.paragraphs[1]), "three");
    }

    #[test]
    fn test_delete_conflict_leaves_document_untouched() {
        let mut doc = Document::from_texts(["abc def ghi"]);
        apply(&mut doc, Locator::text("def"), Action::Delete).unwrap();
        let before = doc.clone();
        let err = apply(&mut doc, Locator::text("c def g"), Action::Delete).unwrap_err();
        assert!(matches!(err, AnnotationError::Conflict(_)));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_empty_span_delete_fails() {
        let mut doc = Document::from_texts(["text", ""]);
        let err = apply(&mut doc, Locator::paragraph(1), Action::Delete).unwrap_err();
        assert_eq!(err, AnnotationError::EmptySpan("delete"));
    }

    #[test]
    fn test_insert_after_inherits_formatting() {
        let mut doc = Document::new();
        let mut para = Paragraph::new();
        let bold = RunProperties::from_elements(vec![PropertyElement::new("b", None, "<w:b/>")]);
        para.inlines.push(Inline::Run(Run::text("Bold", bold.clone())));
        para.inlines.push(Inline::Run(Run::text(" plain", RunProperties::new())));
        doc.paragraphs.push(para);

        apply(
            &mut doc,
            Locator::text("Bold"),
            Action::Insert { text: "*new*".into(), position: InsertPosition::After },
        )
        .unwrap();
        let inserted = doc.paragraphs[0].inlines[1].as_run().unwrap();
        assert_eq!(inserted.content.logical_text(), "new");
        assert!(inserted.properties.style().bold);
        assert!(inserted.properties.style().italic);
        assert!(!inserted.is_anchorable());
        assert_eq!(doc.paragraphs[0].logical_text(), "Bold plain");
    }

    #[test]
    fn test_insert_before_with_line_break() {
        let mut doc = Document::from_texts(["anchor"]);
        apply(
            &mut doc,
            Locator::text("anchor"),
            Action::Insert { text: "one\ntwo".into(), position: InsertPosition::Before },
        )
        .unwrap();
        let para = &doc.paragraphs[0];
        assert_eq!(inserted_text(para), "one\ntwo");
        assert_eq!(para.inlines.last().unwrap().as_run().unwrap().content.logical_text(), "anchor");
    }

    #[test]
    fn test_insert_drops_hyperlink_style() {
        let mut doc = Document::new();
        let mut para = Paragraph::new();
        let mut link = Run::text("site", RunProperties::new().with_character_style("Hyperlink"));
        link.hyperlink = Some(doc_model::Hyperlink { open: "w:hyperlink r:id=\"rId5\"".into(), group: 0 });
        para.inlines.push(Inline::Run(link));
        doc.paragraphs.push(para);

        apply(
            &mut doc,
            Locator::text("site"),
            Action::Insert { text: "!".into(), position: InsertPosition::After },
        )
        .unwrap();
        let inserted = doc.paragraphs[0].inlines[1].as_run().unwrap();
        assert!(inserted.hyperlink.is_none());
        assert!(inserted.properties.get("rStyle").is_none());
    }

    #[test]
    fn test_replace_is_delete_then_insert() {
        let mut doc = Document::from_texts(["old value here"]);
        let applied = apply(
            &mut doc,
            Locator::text("value"),
            Action::Replace { replacement: "number".into() },
        )
        .unwrap();
        assert_eq!(applied.revision_ids, vec![1, 2]);

        let para = &doc.paragraphs[0];
        let deleted = para.inlines[1].as_run().unwrap();
        let inserted = para.inlines[2].as_run().unwrap();
        assert_eq!(deleted.content.logical_text(), "value");
        assert_eq!(inserted.content.logical_text(), "number");
        let del = deleted.revision.deleted.as_ref().unwrap();
        let ins = inserted.revision.inserted.as_ref().unwrap();
        assert_eq!(del.author, ins.author);
        assert_eq!(del.date, ins.date);
        assert_ne!(del.id, ins.id);
        assert_eq!(para.logical_text(), "old value here");
    }

    fn run_text(para: &Paragraph) -> Vec<String> {
        para.inlines
            .iter()
            .filter_map(Inline::as_run)
            .map(|r| r.content.logical_text().to_string())
            .collect()
    }

    #[test]
    fn test_inserts_after_one_anchor_keep_request_order() {
        let mut doc = Document::from_texts(["alpha omega"]);
        for text in [" one", " two"] {
            apply(
                &mut doc,
                Locator::text("alpha"),
                Action::Insert { text: text.into(), position: InsertPosition::After },
            )
            .unwrap();
        }
        assert_eq!(run_text(&doc.paragraphs[0]), vec!["alpha", " one", " two", " omega"]);
    }

    #[test]
    fn test_insert_after_replaced_text_follows_replacement() {
        let mut doc = Document::from_texts(["alpha omega"]);
        apply(&mut doc, Locator::text("alpha"), Action::Replace { replacement: "beta".into() }).unwrap();
        apply(
            &mut doc,
            Locator::text("alpha"),
            Action::Insert { text: " gamma".into(), position: InsertPosition::After },
        )
        .unwrap();
        let para = &doc.paragraphs[0];
        assert_eq!(run_text(para), vec!["alpha", "beta", " gamma", " omega"]);
        assert_eq!(deleted_text(para), "alpha");
        assert_eq!(inserted_text(para), "beta gamma");
    }
}
