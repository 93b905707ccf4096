//! Shared types for the assignment pipeline.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assignments::model::Worker;

/// Maximum number of keywords carried by a feature set.
pub const MAX_KEYWORDS: usize = 10;

/// Round to two decimal places. Every score is passed through this before
/// it is compared or stored.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Extracted features ──────────────────────────────────────────────

/// Estimated effort of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Structured view of a task's free text. Lives for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    /// Important words, in order of appearance, at most [`MAX_KEYWORDS`].
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Inferred skills, lowercased.
    #[serde(default)]
    pub skills: BTreeSet<String>,
    /// Technologies or tools mentioned, lowercased.
    #[serde(default)]
    pub technical_tags: BTreeSet<String>,
    #[serde(default)]
    pub effort_level: EffortLevel,
}

impl ExtractedFeatures {
    /// Lowercase and trim every entry, drop empties, and cap the keyword list.
    pub fn normalized(self) -> Self {
        let keywords = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .collect();
        let lower_set = |set: BTreeSet<String>| {
            set.into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            keywords,
            skills: lower_set(self.skills),
            technical_tags: lower_set(self.technical_tags),
            effort_level: self.effort_level,
        }
    }
}

// ── Candidates ──────────────────────────────────────────────────────

/// Where a candidate's confidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// Parsed from the reasoning backend's reply.
    Backend,
    /// Backend replied without any structured payload; neutral default used.
    NeutralDefault,
    /// Derived from the workload-adjusted score.
    Heuristic,
}

/// One worker threaded through matcher → adjuster → scorer.
///
/// Each stage fills in its own field; the worker never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub worker: Worker,
    /// `2 * skill_overlap + keyword_hits` from the matcher.
    pub match_score: u32,
    /// Availability-weighted score from the workload adjuster.
    pub adjusted_score: f64,
    /// Confidence in [0, 1] from the scorer.
    pub confidence: f64,
    pub rationale: String,
    pub source: ConfidenceSource,
}

impl ScoredCandidate {
    /// A freshly matched candidate, not yet adjusted or scored.
    pub fn matched(worker: Worker, match_score: u32) -> Self {
        Self {
            worker,
            match_score,
            adjusted_score: 0.0,
            confidence: 0.0,
            rationale: String::new(),
            source: ConfidenceSource::Heuristic,
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────

/// What the decision engine did with a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Top candidate met the threshold and was committed.
    AutoAssigned,
    /// Top candidate fell short; task left open for human review.
    Recommended,
    /// No worker matched.
    NoCandidates,
}

impl DecisionOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AutoAssigned => "auto_assigned",
            Self::Recommended => "recommended",
            Self::NoCandidates => "no_candidates",
        }
    }
}

/// Per-candidate line of the confidence breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateBreakdown {
    pub worker_id: Uuid,
    pub name: String,
    pub confidence: f64,
    pub reason: String,
}

impl From<&ScoredCandidate> for CandidateBreakdown {
    fn from(candidate: &ScoredCandidate) -> Self {
        Self {
            worker_id: candidate.worker.id,
            name: candidate.worker.name.clone(),
            confidence: candidate.confidence,
            reason: candidate.rationale.clone(),
        }
    }
}

/// Structured result of one `run_assignment` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub task_id: Uuid,
    /// Task title.
    pub task: String,
    pub decision: DecisionOutcome,
    /// Committed assignee (auto-assign) or recommended one (below threshold).
    pub assignee: Option<String>,
    pub assignee_id: Option<Uuid>,
    /// Confidence of the top candidate, 0.0 when nobody matched.
    pub confidence_score: f64,
    pub reasoning: String,
    pub confidence_breakdown: Vec<CandidateBreakdown>,
    pub notification_sent: bool,
}
