//! Decision engine: the single point of mutation in a pipeline run.
//!
//! Only the top-ranked candidate is considered. It is committed when its
//! confidence meets the threshold (`>=`); otherwise the task stays open and
//! the candidate is reported as a recommendation.

use crate::assignments::model::{AssignmentDecisionRecord, DecisionStatus, WorkItem};
use crate::config::AssignmentConfig;
use crate::error::PipelineError;
use crate::notify::{AssignmentNotice, Notifier};
use crate::pipeline::types::{DecisionOutcome, ScoredCandidate};
use crate::store::{AssignmentCommit, Database};

pub const NO_CANDIDATES_REASONING: &str = "No candidates matched.";

/// What the engine decided and what it wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    /// The candidate the decision was made on; `None` for `NoCandidates`.
    pub top: Option<ScoredCandidate>,
    /// The audit record written by this decision, if any.
    pub record: Option<AssignmentDecisionRecord>,
    pub notification_sent: bool,
}

/// Dependencies of the decision step.
pub struct DecisionEngine<'a> {
    pub db: &'a dyn Database,
    pub notifier: &'a dyn Notifier,
    pub config: &'a AssignmentConfig,
}

impl DecisionEngine<'_> {
    /// Decide on `candidates`, which must already be sorted by confidence.
    ///
    /// Only persistence failures are returned as errors. A notification
    /// failure is logged and leaves the commit in place.
    pub async fn decide(
        &self,
        task: &WorkItem,
        candidates: &[ScoredCandidate],
        threshold: f64,
    ) -> Result<Decision, PipelineError> {
        let Some(top) = candidates.first() else {
            let record = AssignmentDecisionRecord::new(
                task.id,
                None,
                NO_CANDIDATES_REASONING,
                0.0,
                DecisionStatus::NoCandidates,
            );
            self.db.append_decision(&record).await?;
            tracing::info!(task_id = %task.id, "No candidates matched");
            return Ok(Decision {
                outcome: DecisionOutcome::NoCandidates,
                top: None,
                record: Some(record),
                notification_sent: false,
            });
        };

        if top.confidence < threshold {
            tracing::info!(
                task_id = %task.id,
                worker = %top.worker.name,
                confidence = top.confidence,
                threshold,
                "Below threshold, recommending for review"
            );
            return Ok(Decision {
                outcome: DecisionOutcome::Recommended,
                top: Some(top.clone()),
                record: None,
                notification_sent: false,
            });
        }

        let record = self
            .db
            .commit_assignment(&AssignmentCommit {
                task_id: task.id,
                worker_id: top.worker.id,
                confidence: top.confidence,
                rationale: top.rationale.clone(),
                decision_status: DecisionStatus::AutoAssigned,
            })
            .await?;

        tracing::info!(
            task_id = %task.id,
            worker = %top.worker.name,
            confidence = top.confidence,
            "Auto-assigned"
        );

        let notification_sent = self.notify(task, top).await;

        Ok(Decision {
            outcome: DecisionOutcome::AutoAssigned,
            top: Some(top.clone()),
            record: Some(record),
            notification_sent,
        })
    }

    async fn notify(&self, task: &WorkItem, top: &ScoredCandidate) -> bool {
        if !self.config.notifications_enabled {
            return false;
        }

        let notice = AssignmentNotice::new(
            task,
            &top.worker,
            top.confidence,
            top.rationale.clone(),
            self.config.assigned_by.clone(),
            self.config.task_url(task.id),
        );

        match self.notifier.notify(&notice).await {
            Ok(sent) => sent,
            Err(e) => {
                tracing::warn!(
                    task_id = %task.id,
                    notifier = self.notifier.name(),
                    error = %e,
                    "Assignment notification failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::model::{WorkStatus, Worker};
    use crate::error::NotifyError;
    use crate::notify::DisabledNotifier;
    use crate::store::LibSqlBackend;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Notifier that records notices, optionally failing each send.
    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<AssignmentNotice>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, notice: &AssignmentNotice) -> Result<bool, NotifyError> {
            if self.fail {
                return Err(NotifyError::SendFailed {
                    address: notice.assignee_email.clone(),
                    reason: "mailbox unavailable".into(),
                });
            }
            self.sent.lock().unwrap().push(notice.clone());
            Ok(true)
        }
    }

    async fn setup() -> (LibSqlBackend, WorkItem, Worker) {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let task = WorkItem::new("Build REST API", "for invoices");
        let worker = Worker::new("Dhruv", "dhruv@example.com", "Backend Engineer");
        db.insert_task(&task).await.unwrap();
        db.insert_worker(&worker).await.unwrap();
        (db, task, worker)
    }

    fn scored(worker: &Worker, confidence: f64) -> ScoredCandidate {
        let mut c = ScoredCandidate::matched(worker.clone(), 2);
        c.adjusted_score = confidence;
        c.confidence = confidence;
        c.rationale = "fits".into();
        c
    }

    #[tokio::test]
    async fn empty_candidates_record_no_candidates() {
        let (db, task, _) = setup().await;
        let config = AssignmentConfig::default();
        let engine = DecisionEngine { db: &db, notifier: &DisabledNotifier, config: &config };

        let decision = engine.decide(&task, &[], 0.75).await.unwrap();
        assert_eq!(decision.outcome, DecisionOutcome::NoCandidates);

        let history = db.list_decisions(task.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].decision_status, DecisionStatus::NoCandidates);
        assert_eq!(history[0].confidence, 0.0);
        assert_eq!(db.get_task(task.id).await.unwrap().unwrap().status, WorkStatus::Open);
    }

    #[tokio::test]
    async fn confidence_equal_to_threshold_commits() {
        let (db, task, worker) = setup().await;
        let config = AssignmentConfig::default();
        let notifier = RecordingNotifier::default();
        let engine = DecisionEngine { db: &db, notifier: &notifier, config: &config };

        let decision = engine.decide(&task, &[scored(&worker, 0.75)], 0.75).await.unwrap();
        assert_eq!(decision.outcome, DecisionOutcome::AutoAssigned);
        assert!(decision.notification_sent);

        let stored = db.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkStatus::Assigned);
        assert_eq!(stored.assignee_id, Some(worker.id));
        assert_eq!(stored.confidence_score, Some(0.75));

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].assignee_email, "dhruv@example.com");
        assert_eq!(sent[0].assigned_by, "AI Task Engine");
    }

    #[tokio::test]
    async fn below_threshold_recommends_without_writing() {
        let (db, task, worker) = setup().await;
        let config = AssignmentConfig::default();
        let engine = DecisionEngine { db: &db, notifier: &DisabledNotifier, config: &config };

        let decision = engine.decide(&task, &[scored(&worker, 0.74)], 0.75).await.unwrap();
        assert_eq!(decision.outcome, DecisionOutcome::Recommended);
        assert_eq!(decision.top.unwrap().worker.id, worker.id);
        assert!(decision.record.is_none());

        assert!(db.list_decisions(task.id).await.unwrap().is_empty());
        let stored = db.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkStatus::Open);
        assert!(stored.confidence_score.is_none());
    }

    #[tokio::test]
    async fn only_top_candidate_is_considered() {
        let (db, task, worker) = setup().await;
        let other = Worker::new("Manaal", "manaal@example.com", "Dev");
        db.insert_worker(&other).await.unwrap();
        let config = AssignmentConfig::default();
        let engine = DecisionEngine { db: &db, notifier: &DisabledNotifier, config: &config };

        // Second candidate clears the threshold but is never a fallback assignee.
        let decision = engine
            .decide(&task, &[scored(&worker, 0.7), scored(&other, 0.9)], 0.75)
            .await
            .unwrap();
        assert_eq!(decision.outcome, DecisionOutcome::Recommended);
        assert!(db.get_task(task.id).await.unwrap().unwrap().assignee_id.is_none());
    }

    #[tokio::test]
    async fn notification_failure_keeps_commit() {
        let (db, task, worker) = setup().await;
        let config = AssignmentConfig::default();
        let notifier = RecordingNotifier { fail: true, ..Default::default() };
        let engine = DecisionEngine { db: &db, notifier: &notifier, config: &config };

        let decision = engine.decide(&task, &[scored(&worker, 0.9)], 0.75).await.unwrap();
        assert_eq!(decision.outcome, DecisionOutcome::AutoAssigned);
        assert!(!decision.notification_sent);
        assert_eq!(
            db.get_task(task.id).await.unwrap().unwrap().assignee_id,
            Some(worker.id)
        );
    }

    #[tokio::test]
    async fn disabled_notifications_skip_notifier() {
        let (db, task, worker) = setup().await;
        let config = AssignmentConfig { notifications_enabled: false, ..Default::default() };
        let notifier = RecordingNotifier::default();
        let engine = DecisionEngine { db: &db, notifier: &notifier, config: &config };

        let decision = engine.decide(&task, &[scored(&worker, 0.9)], 0.75).await.unwrap();
        assert!(!decision.notification_sent);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_task_surfaces_persistence_error() {
        let (db, _, worker) = setup().await;
        let config = AssignmentConfig::default();
        let engine = DecisionEngine { db: &db, notifier: &DisabledNotifier, config: &config };
        let ghost = WorkItem::new("ghost", "");

        let err = engine.decide(&ghost, &[scored(&worker, 0.9)], 0.75).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(_)));
    }
}
