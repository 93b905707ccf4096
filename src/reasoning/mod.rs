//! Reasoning backend capability used by the extractor and the scorer.
//!
//! Two implementations ship with the crate:
//! - [`LlmReasoner`]: prompts an `LlmProvider` and validates its replies.
//! - [`OfflineBackend`]: always reports [`BackendError::Unavailable`], so every
//!   stage takes its deterministic fallback.
//!
//! Backend calls return `Result` and never panic or raise past the calling
//! stage; each stage branches on the error to pick its fallback.

mod llm;
pub mod parse;

pub use llm::LlmReasoner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::assignments::model::{WorkItem, Worker};
use crate::error::BackendError;
use crate::pipeline::types::ExtractedFeatures;

/// Neutral confidence substituted when a reply has no structured payload.
pub const NEUTRAL_CONFIDENCE: f64 = 0.6;

/// A validated `{confidence, reason}` reply for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceVerdict {
    /// Clamped to [0, 1]; not yet rounded.
    pub confidence: f64,
    pub reason: String,
}

/// External reasoning capability.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Turn a task's title and description into structured features.
    async fn extract_features(&self, task: &WorkItem) -> Result<ExtractedFeatures, BackendError>;

    /// Judge how well one worker fits a task.
    async fn score_confidence(
        &self,
        task: &WorkItem,
        worker: &Worker,
    ) -> Result<ConfidenceVerdict, BackendError>;
}

/// Deterministic stub used when no reasoning backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

#[async_trait]
impl ReasoningBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn extract_features(&self, _task: &WorkItem) -> Result<ExtractedFeatures, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn score_confidence(
        &self,
        _task: &WorkItem,
        _worker: &Worker,
    ) -> Result<ConfidenceVerdict, BackendError> {
        Err(BackendError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_backend_is_always_unavailable() {
        let backend = OfflineBackend;
        let task = WorkItem::new("t", "d");
        let worker = Worker::new("w", "w@example.com", "Engineer");

        assert_eq!(
            backend.extract_features(&task).await,
            Err(BackendError::Unavailable)
        );
        assert_eq!(
            backend.score_confidence(&task, &worker).await,
            Err(BackendError::Unavailable)
        );
    }
}
