//! Pipeline orchestrator: extract → match → adjust → score → decide.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::AssignmentConfig;
use crate::error::PipelineError;
use crate::notify::Notifier;
use crate::pipeline::decision::{DecisionEngine, NO_CANDIDATES_REASONING};
use crate::pipeline::types::{AssignmentResult, CandidateBreakdown};
use crate::pipeline::{extractor, matcher, scorer, workload};
use crate::reasoning::ReasoningBackend;
use crate::store::Database;

/// Runs assignment for one task at a time. Cheap to share behind an `Arc`;
/// concurrent runs only meet at the database's commit step.
pub struct AssignmentPipeline {
    db: Arc<dyn Database>,
    backend: Arc<dyn ReasoningBackend>,
    notifier: Arc<dyn Notifier>,
    config: AssignmentConfig,
}

impl AssignmentPipeline {
    pub fn new(
        db: Arc<dyn Database>,
        backend: Arc<dyn ReasoningBackend>,
        notifier: Arc<dyn Notifier>,
        config: AssignmentConfig,
    ) -> Self {
        Self {
            db,
            backend,
            notifier,
            config,
        }
    }

    /// Run the full pipeline for a task.
    ///
    /// `threshold` overrides the configured one for this run. Re-running an
    /// already assigned task re-evaluates it; a new commit appends a new
    /// audit record.
    pub async fn run_assignment(
        &self,
        task_id: Uuid,
        threshold: Option<f64>,
    ) -> Result<AssignmentResult, PipelineError> {
        let threshold = threshold.unwrap_or(self.config.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::InvalidThreshold(threshold));
        }

        let task = self
            .db
            .get_task(task_id)
            .await?
            .ok_or(PipelineError::TaskNotFound(task_id))?;

        tracing::info!(
            task_id = %task.id,
            title = %task.title,
            backend = self.backend.name(),
            threshold,
            "Running assignment pipeline"
        );

        let features = extractor::extract(self.backend.as_ref(), &task).await;
        let pool = self.db.list_workers().await?;
        let matched = matcher::rank(&features, &pool);
        tracing::debug!(
            task_id = %task.id,
            pool = pool.len(),
            matched = matched.len(),
            "Candidates matched"
        );

        let adjusted = workload::adjust(matched, &self.config.workload);
        let scored = scorer::score(self.backend.as_ref(), &task, adjusted).await;

        let engine = DecisionEngine {
            db: self.db.as_ref(),
            notifier: self.notifier.as_ref(),
            config: &self.config,
        };
        let decision = engine
            .decide(&task, &scored, threshold)
            .await
            .inspect_err(|e| {
                tracing::error!(task_id = %task.id, error = %e, "Decision could not be persisted");
            })?;

        let breakdown: Vec<CandidateBreakdown> = scored.iter().map(CandidateBreakdown::from).collect();
        for line in &breakdown {
            tracing::info!(
                task_id = %task.id,
                "{}: {:.1}% ({})",
                line.name,
                line.confidence * 100.0,
                line.reason
            );
        }

        let top = decision.top.as_ref();
        let result = AssignmentResult {
            task_id: task.id,
            task: task.title.clone(),
            decision: decision.outcome,
            assignee: top.map(|c| c.worker.name.clone()),
            assignee_id: top.map(|c| c.worker.id),
            confidence_score: top.map(|c| c.confidence).unwrap_or(0.0),
            reasoning: top
                .map(|c| c.rationale.clone())
                .unwrap_or_else(|| NO_CANDIDATES_REASONING.to_string()),
            confidence_breakdown: breakdown,
            notification_sent: decision.notification_sent,
        };

        tracing::info!(
            task_id = %task.id,
            decision = result.decision.label(),
            assignee = result.assignee.as_deref().unwrap_or("-"),
            confidence = result.confidence_score,
            "Assignment pipeline finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::model::{WorkItem, Worker};
    use crate::notify::DisabledNotifier;
    use crate::pipeline::types::DecisionOutcome;
    use crate::reasoning::OfflineBackend;
    use crate::store::LibSqlBackend;

    async fn pipeline() -> (AssignmentPipeline, Arc<LibSqlBackend>) {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let pipeline = AssignmentPipeline::new(
            db.clone(),
            Arc::new(OfflineBackend),
            Arc::new(DisabledNotifier),
            AssignmentConfig::default(),
        );
        (pipeline, db)
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let (pipeline, _) = pipeline().await;
        let id = Uuid::new_v4();
        let err = pipeline.run_assignment(id, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::TaskNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn out_of_range_threshold_is_rejected() {
        let (pipeline, db) = pipeline().await;
        let task = WorkItem::new("t", "d");
        db.insert_task(&task).await.unwrap();

        for bad in [1.5, -0.1, f64::NAN] {
            let err = pipeline.run_assignment(task.id, Some(bad)).await.unwrap_err();
            assert!(matches!(err, PipelineError::InvalidThreshold(_)));
        }
    }

    #[tokio::test]
    async fn breakdown_lists_every_scored_candidate() {
        let (pipeline, db) = pipeline().await;
        let task = WorkItem::new("Fix billing api", "");
        db.insert_task(&task).await.unwrap();
        db.insert_worker(&Worker::new("A", "a@example.com", "API lead").with_workload(0.5))
            .await
            .unwrap();
        db.insert_worker(&Worker::new("B", "b@example.com", "Billing API dev").with_workload(0.1))
            .await
            .unwrap();

        let result = pipeline.run_assignment(task.id, Some(0.99)).await.unwrap();
        assert_eq!(result.decision, DecisionOutcome::Recommended);
        assert_eq!(result.confidence_breakdown.len(), 2);
        assert_eq!(result.confidence_breakdown[0].name, "B");
        assert_eq!(result.confidence_breakdown[0].confidence, 0.94);
        assert_eq!(result.confidence_breakdown[1].confidence, 0.7);
        assert_eq!(result.assignee.as_deref(), Some("B"));
        assert_eq!(result.confidence_score, 0.94);
        assert!(!result.notification_sent);
    }
}
