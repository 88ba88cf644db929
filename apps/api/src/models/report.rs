//! Derived, immutable outputs of a scoring pass.

use serde::{Deserialize, Serialize};

use crate::models::document::LocationRef;

/// Declaration order is the display order within a severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Layout,
    Structure,
    Keyword,
}

/// Declaration order is the display order: most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Stable across passes for the same document and job description.
    pub id: String,
    pub category: SuggestionCategory,
    pub severity: Severity,
    /// `None` for document-level suggestions.
    pub location_ref: Option<LocationRef>,
    pub message: String,
    /// The keyword, flag or heading the suggestion is about, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Filled only when a rewrite is explicitly requested.
    #[serde(default)]
    pub suggested_replacement_text: Option<String>,
}

impl Suggestion {
    /// Returns a copy carrying the rewrite text; the original stays untouched.
    pub fn with_replacement(&self, text: String) -> Suggestion {
        Suggestion {
            suggested_replacement_text: Some(text),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub layout: u32,   // 0 – 100
    pub keywords: u32, // 0 – 100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub overall: u32, // 0 – 100
    pub sub_scores: SubScores,
    pub suggestions: Vec<Suggestion>,
    /// Job terms (display form) present in the readable resume text, in rank order.
    pub matched_terms: Vec<String>,
    /// Job terms absent from the readable resume text, in rank order.
    pub missing_terms: Vec<String>,
    pub recommendation: String,
    /// Version of the keyword tables the pass ran with.
    pub tables_version: String,
}
