//! Engine configuration

use crate::EngineError;
use serde::{Deserialize, Serialize};

/// What a batch returns when some of its requests fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AtomicityPolicy {
    /// No document is produced unless every request applied
    #[default]
    AllOrNothing,
    /// The document carries every request that applied
    Partial,
}

/// Tunables of the annotation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub atomicity: AtomicityPolicy,
    /// Closest matches reported for a failed text locator
    pub max_closest_matches: usize,
    /// Characters of context on each side of a closest-match fragment
    pub snippet_radius: usize,
    /// Paragraphs joined in one cross-paragraph search window
    pub cross_paragraph_window: usize,
    /// Shortest common fragment that makes a paragraph a closest match
    pub min_fragment_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            atomicity: AtomicityPolicy::AllOrNothing,
            max_closest_matches: 3,
            snippet_radius: 40,
            cross_paragraph_window: 3,
            min_fragment_length: 4,
        }
    }
}

impl EngineConfig {
    pub fn with_atomicity(mut self, atomicity: AtomicityPolicy) -> Self {
        self.atomicity = atomicity;
        self
    }

    /// Parse a configuration from JSON; absent fields take their defaults
    pub fn from_json(content: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a configuration, falling back to defaults when it is invalid
    pub fn from_json_or_default(content: &str) -> Self {
        Self::from_json(content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse config, using defaults: {}", e);
            Self::default()
        })
    }
}
