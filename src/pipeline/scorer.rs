//! Confidence scorer: one backend call per candidate, with per-candidate fallback.

use crate::assignments::model::WorkItem;
use crate::error::BackendError;
use crate::pipeline::types::{ConfidenceSource, ScoredCandidate, round2};
use crate::reasoning::{NEUTRAL_CONFIDENCE, ReasoningBackend};

pub const NO_BACKEND_RATIONALE: &str = "Heuristic confidence (no reasoning backend)";
pub const BACKEND_FAILURE_RATIONALE: &str = "backend failure, used heuristic";
pub const UNUSABLE_RESPONSE_RATIONALE: &str = "Backend response unusable, neutral confidence applied";

/// Deterministic confidence derived from the adjusted score.
pub fn heuristic_confidence(adjusted_score: f64) -> f64 {
    round2(adjusted_score.min(1.0))
}

/// Score candidates in ranked order, then sort by confidence, descending.
///
/// Calls are sequential. A failure for one candidate only affects that
/// candidate. The final sort is stable, so equal confidences keep the
/// adjuster's order.
pub async fn score(
    backend: &dyn ReasoningBackend,
    task: &WorkItem,
    candidates: Vec<ScoredCandidate>,
) -> Vec<ScoredCandidate> {
    let mut scored = Vec::with_capacity(candidates.len());

    for mut candidate in candidates {
        let (confidence, rationale, source) =
            match backend.score_confidence(task, &candidate.worker).await {
                Ok(verdict) => (verdict.confidence, verdict.reason, ConfidenceSource::Backend),
                Err(BackendError::Unavailable) => (
                    candidate.adjusted_score,
                    NO_BACKEND_RATIONALE.to_string(),
                    ConfidenceSource::Heuristic,
                ),
                Err(BackendError::NoPayload) => {
                    tracing::warn!(
                        task_id = %task.id,
                        worker = %candidate.worker.name,
                        "Confidence reply had no structured payload"
                    );
                    (
                        NEUTRAL_CONFIDENCE,
                        UNUSABLE_RESPONSE_RATIONALE.to_string(),
                        ConfidenceSource::NeutralDefault,
                    )
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = %task.id,
                        worker = %candidate.worker.name,
                        error = %e,
                        "Confidence scoring failed, using heuristic"
                    );
                    (
                        candidate.adjusted_score,
                        BACKEND_FAILURE_RATIONALE.to_string(),
                        ConfidenceSource::Heuristic,
                    )
                }
            };

        candidate.confidence = match source {
            ConfidenceSource::Heuristic => heuristic_confidence(confidence),
            _ => round2(confidence.clamp(0.0, 1.0)),
        };
        candidate.rationale = rationale;
        candidate.source = source;
        scored.push(candidate);
    }

    scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::model::Worker;
    use crate::pipeline::types::ExtractedFeatures;
    use crate::reasoning::{ConfidenceVerdict, OfflineBackend};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Backend with a canned confidence outcome per worker name.
    struct PerWorker(HashMap<String, Result<ConfidenceVerdict, BackendError>>);

    #[async_trait]
    impl ReasoningBackend for PerWorker {
        fn name(&self) -> &str {
            "per-worker"
        }

        async fn extract_features(&self, _task: &WorkItem) -> Result<ExtractedFeatures, BackendError> {
            Err(BackendError::Unavailable)
        }

        async fn score_confidence(
            &self,
            _task: &WorkItem,
            worker: &Worker,
        ) -> Result<ConfidenceVerdict, BackendError> {
            self.0
                .get(&worker.name)
                .cloned()
                .unwrap_or(Err(BackendError::Unavailable))
        }
    }

    fn candidate(name: &str, adjusted: f64) -> ScoredCandidate {
        let mut c = ScoredCandidate::matched(Worker::new(name, format!("{name}@example.com"), "Dev"), 1);
        c.adjusted_score = adjusted;
        c
    }

    fn verdict(confidence: f64, reason: &str) -> Result<ConfidenceVerdict, BackendError> {
        Ok(ConfidenceVerdict {
            confidence,
            reason: reason.to_string(),
        })
    }

    #[test]
    fn heuristic_caps_at_one() {
        assert_eq!(heuristic_confidence(0.88), 0.88);
        assert_eq!(heuristic_confidence(1.3), 1.0);
    }

    #[tokio::test]
    async fn no_backend_uses_adjusted_score() {
        let task = WorkItem::new("t", "d");
        let scored = score(&OfflineBackend, &task, vec![candidate("a", 0.88), candidate("b", 0.46)]).await;
        assert_eq!(scored[0].confidence, 0.88);
        assert_eq!(scored[0].rationale, NO_BACKEND_RATIONALE);
        assert_eq!(scored[0].source, ConfidenceSource::Heuristic);
        assert_eq!(scored[1].confidence, 0.46);
    }

    #[tokio::test]
    async fn heuristic_path_is_deterministic() {
        let task = WorkItem::new("t", "d");
        let first = score(&OfflineBackend, &task, vec![candidate("a", 0.7)]).await;
        let second = score(&OfflineBackend, &task, vec![candidate("a", 0.7)]).await;
        assert_eq!(first[0].confidence, second[0].confidence);
    }

    #[tokio::test]
    async fn parse_failure_uses_adjusted_score_not_neutral_default() {
        let backend = PerWorker(HashMap::from([(
            "a".to_string(),
            Err(BackendError::ParseFailed("not json".into())),
        )]));
        let task = WorkItem::new("t", "d");
        let scored = score(&backend, &task, vec![candidate("a", 0.82)]).await;
        assert_eq!(scored[0].confidence, 0.82);
        assert_eq!(scored[0].rationale, BACKEND_FAILURE_RATIONALE);
    }

    #[tokio::test]
    async fn missing_payload_uses_neutral_default() {
        let backend = PerWorker(HashMap::from([("a".to_string(), Err(BackendError::NoPayload))]));
        let task = WorkItem::new("t", "d");
        let scored = score(&backend, &task, vec![candidate("a", 0.94)]).await;
        assert_eq!(scored[0].confidence, 0.6);
        assert_eq!(scored[0].rationale, UNUSABLE_RESPONSE_RATIONALE);
        assert_eq!(scored[0].source, ConfidenceSource::NeutralDefault);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_candidate() {
        let backend = PerWorker(HashMap::from([
            ("a".to_string(), Err(BackendError::Timeout(std::time::Duration::from_secs(30)))),
            ("b".to_string(), verdict(0.91, "exact skills")),
        ]));
        let task = WorkItem::new("t", "d");
        let scored = score(&backend, &task, vec![candidate("a", 0.7), candidate("b", 0.5)]).await;
        assert_eq!(scored[0].worker.name, "b");
        assert_eq!(scored[0].confidence, 0.91);
        assert_eq!(scored[0].source, ConfidenceSource::Backend);
        assert_eq!(scored[1].worker.name, "a");
        assert_eq!(scored[1].confidence, 0.7);
    }

    #[tokio::test]
    async fn backend_confidence_is_rounded() {
        let backend = PerWorker(HashMap::from([("a".to_string(), verdict(0.8349, "ok"))]));
        let task = WorkItem::new("t", "d");
        let scored = score(&backend, &task, vec![candidate("a", 0.5)]).await;
        assert_eq!(scored[0].confidence, 0.83);
        assert_eq!(scored[0].rationale, "ok");
    }

    #[tokio::test]
    async fn equal_confidence_keeps_input_order() {
        let task = WorkItem::new("t", "d");
        let scored = score(&OfflineBackend, &task, vec![candidate("a", 0.7), candidate("b", 0.7)]).await;
        assert_eq!(scored[0].worker.name, "a");
        assert_eq!(scored[1].worker.name, "b");
    }
}
