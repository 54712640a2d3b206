//! Author, timestamp and id allocation shared by every mutation of a batch

use chrono::{DateTime, SecondsFormat, Utc};
use doc_model::RevisionMark;
use serde::{Deserialize, Serialize};

/// Who annotations are attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub initials: String,
}

impl Author {
    pub fn new(name: impl Into<String>, initials: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initials: initials.into(),
        }
    }
}

impl Default for Author {
    fn default() -> Self {
        Self::new("AI Assistant", "AI")
    }
}

/// Attribution context of one batch
///
/// The timestamp is fixed when the batch starts; ids are handed out
/// monotonically from the first id free in the document.
#[derive(Debug, Clone)]
pub struct Attribution {
    author: Author,
    date: String,
    next_id: u32,
}

impl Attribution {
    pub fn new(author: Author, timestamp: DateTime<Utc>, first_id: u32) -> Self {
        Self {
            author,
            date: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            next_id: first_id,
        }
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    /// ISO 8601 timestamp stamped on every annotation of the batch
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Allocate the next annotation id
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// A fresh revision mark with a newly allocated id
    pub fn revision(&mut self) -> RevisionMark {
        let id = self.next_id();
        RevisionMark::new(id, self.author.name.clone(), self.date.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ids_are_monotonic() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let mut attribution = Attribution::new(Author::default(), at, 7);
        assert_eq!(attribution.next_id(), 7);
        let mark = attribution.revision();
        assert_eq!(mark.id, 8);
        assert_eq!(mark.author, "AI Assistant");
        assert_eq!(mark.date.as_deref(), Some("2024-01-15T10:30:00Z"));
        assert!(mark.is_from_batch());
        assert_eq!(attribution.next_id(), 9);
    }

    #[test]
    fn test_default_author() {
        let author = Author::default();
        assert_eq!(author.name, "AI Assistant");
        assert_eq!(author.initials, "AI");
    }
}
