//! Prompt extraction and semantic category metrics.
//!
//! Classification itself is an injected capability (see `asa-llm`); this
//! module owns the category vocabulary, the prompt extraction that feeds
//! the classifier, and the pure aggregation over classified prompts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::EventKind;
use crate::ingest::SessionEvents;
use crate::scope::TimeScope;

/// Number of neighboring prompts attached as conversation context on each
/// side of a prompt sent for classification.
pub const CONTEXT_WINDOW: usize = 2;

/// Semantic categories a prompt can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptCategory {
    Question,
    Implementation,
    Debugging,
    Clarification,
    Review,
    Refactoring,
    Exploration,
    Testing,
    Directive,
    Feedback,
    /// Wildcard for prompts that fit none of the above; carries a custom
    /// name in [`Classification::custom`].
    Other,
}

impl PromptCategory {
    pub const ALL: [Self; 11] = [
        Self::Question,
        Self::Implementation,
        Self::Debugging,
        Self::Clarification,
        Self::Review,
        Self::Refactoring,
        Self::Exploration,
        Self::Testing,
        Self::Directive,
        Self::Feedback,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Implementation => "implementation",
            Self::Debugging => "debugging",
            Self::Clarification => "clarification",
            Self::Review => "review",
            Self::Refactoring => "refactoring",
            Self::Exploration => "exploration",
            Self::Testing => "testing",
            Self::Directive => "directive",
            Self::Feedback => "feedback",
            Self::Other => "other",
        }
    }

    /// Human-readable description, used in classifier instructions and
    /// report legends.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Question => "Asking for information or explanation",
            Self::Implementation => "Requesting code to be written or features added",
            Self::Debugging => "Fixing errors, bugs, or issues",
            Self::Clarification => "Asking for more detail on a prior response",
            Self::Review => "Code review or verification request",
            Self::Refactoring => "Restructuring or improving existing code",
            Self::Exploration => "Understanding codebase structure or concepts",
            Self::Testing => "Writing or running tests",
            Self::Directive => "Direct instruction or command to proceed",
            Self::Feedback => "Correcting or guiding the assistant's approach",
            Self::Other => "Custom category that doesn't fit predefined ones",
        }
    }

    /// Parse a category name, folding anything unrecognized into `Other`.
    /// Classifier output is untrusted, so this never fails.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .unwrap_or(Self::Other)
    }
}

impl std::fmt::Display for PromptCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user prompt pulled out of the event stream, ready for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPrompt {
    pub session_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Up to [`CONTEXT_WINDOW`] preceding prompts from the same session.
    pub context_before: Vec<String>,
    /// Up to [`CONTEXT_WINDOW`] following prompts from the same session.
    pub context_after: Vec<String>,
}

/// The classifier's verdict for one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// 1-3 categories; empty means the prompt stayed unclassified.
    pub categories: Vec<PromptCategory>,
    /// Custom name accompanying an `Other` assignment.
    pub custom: Option<String>,
}

impl Classification {
    /// The degradation value used when a classification call fails.
    #[must_use]
    pub const fn unclassified() -> Self {
        Self {
            categories: Vec::new(),
            custom: None,
        }
    }

    #[must_use]
    pub const fn is_unclassified(&self) -> bool {
        self.categories.is_empty()
    }
}

/// A prompt together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPrompt {
    pub prompt: ExtractedPrompt,
    pub classification: Classification,
}

/// One category's share of the classified prompts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Aggregated semantics over all classified prompts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticMetrics {
    pub total_prompts: usize,
    /// Predefined-category counts, descending.
    pub category_counts: Vec<CategoryCount>,
    /// Custom categories discovered through `Other`, descending.
    pub custom_categories: Vec<CategoryCount>,
    /// Prompts assigned more than one category.
    pub multi_category_count: usize,
    pub multi_category_percentage: f64,
    /// Prompts whose classification failed or was skipped.
    pub unclassified_count: usize,
    pub unique_sessions: usize,
}

/// Pull in-scope submitted prompts out of the ingested sessions, attaching
/// a context window of neighboring prompts from the same session.
#[must_use]
pub fn extract_prompts(
    sessions: &[SessionEvents],
    scope: &TimeScope,
    context_window: usize,
) -> Vec<ExtractedPrompt> {
    let mut all = Vec::new();

    for session in sessions {
        let mut submits: Vec<(DateTime<Utc>, &str)> = session
            .events
            .iter()
            .filter(|event| event.kind == EventKind::PromptSubmit && scope.contains(event.timestamp))
            .filter_map(|event| {
                event
                    .prompt
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .map(|text| (event.timestamp, text))
            })
            .collect();
        submits.sort_by_key(|(at, _)| *at);

        for (idx, (at, text)) in submits.iter().enumerate() {
            let before_start = idx.saturating_sub(context_window);
            let after_end = (idx + 1 + context_window).min(submits.len());

            all.push(ExtractedPrompt {
                session_id: session.session_id.clone(),
                text: (*text).to_string(),
                timestamp: *at,
                context_before: submits[before_start..idx]
                    .iter()
                    .map(|(_, t)| (*t).to_string())
                    .collect(),
                context_after: submits[idx + 1..after_end]
                    .iter()
                    .map(|(_, t)| (*t).to_string())
                    .collect(),
            });
        }
    }

    all.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    all
}

#[expect(clippy::cast_precision_loss, reason = "prompt counts are small")]
fn percentage_of(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

fn sorted_counts(counter: BTreeMap<String, usize>, total: usize) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = counter
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label,
            count,
            percentage: percentage_of(count, total),
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

/// Aggregate classified prompts; `None` when there is nothing to report.
#[must_use]
pub fn calculate_semantic_metrics(prompts: &[ClassifiedPrompt]) -> Option<SemanticMetrics> {
    if prompts.is_empty() {
        return None;
    }

    let total = prompts.len();
    let mut category_counter: BTreeMap<String, usize> = BTreeMap::new();
    let mut custom_counter: BTreeMap<String, usize> = BTreeMap::new();
    let mut multi_category_count = 0;
    let mut unclassified_count = 0;
    let mut sessions: BTreeSet<&str> = BTreeSet::new();

    for prompt in prompts {
        sessions.insert(prompt.prompt.session_id.as_str());

        let classification = &prompt.classification;
        if classification.is_unclassified() {
            unclassified_count += 1;
            continue;
        }
        if classification.categories.len() > 1 {
            multi_category_count += 1;
        }
        for category in &classification.categories {
            *category_counter.entry(category.to_string()).or_default() += 1;
        }
        if let Some(custom) = classification.custom.as_deref().filter(|c| !c.is_empty()) {
            *custom_counter.entry(custom.to_string()).or_default() += 1;
        }
    }

    Some(SemanticMetrics {
        total_prompts: total,
        category_counts: sorted_counts(category_counter, total),
        custom_categories: sorted_counts(custom_counter, total),
        multi_category_count,
        multi_category_percentage: percentage_of(multi_category_count, total),
        unclassified_count,
        unique_sessions: sessions.len(),
    })
}
