//! Manager override: assign a task by hand, outside the pipeline.

use uuid::Uuid;

use crate::assignments::model::{AssignmentDecisionRecord, DecisionStatus};
use crate::error::PipelineError;
use crate::store::{AssignmentCommit, Database};

/// A manager's assignment decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualAssignment {
    pub task_id: Uuid,
    pub worker_id: Uuid,
    /// Confidence the manager attaches to the choice, in [0, 1].
    pub confidence: f64,
    /// Free-form note, e.g. "approve" or "reassign".
    pub note: String,
}

/// Commit a manual assignment with a `manager_assigned` audit record.
///
/// Goes through the same atomic commit as automatic decisions, so the
/// task and its audit trail stay consistent.
pub async fn manual_assign(
    db: &dyn Database,
    request: &ManualAssignment,
) -> Result<AssignmentDecisionRecord, PipelineError> {
    if !(0.0..=1.0).contains(&request.confidence) {
        return Err(PipelineError::InvalidConfidence(request.confidence));
    }
    if db.get_task(request.task_id).await?.is_none() {
        return Err(PipelineError::TaskNotFound(request.task_id));
    }
    let worker = db
        .get_worker(request.worker_id)
        .await?
        .ok_or(PipelineError::WorkerNotFound(request.worker_id))?;

    let record = db
        .commit_assignment(&AssignmentCommit {
            task_id: request.task_id,
            worker_id: worker.id,
            confidence: request.confidence,
            rationale: format!("Manual assignment: {}", request.note),
            decision_status: DecisionStatus::ManagerAssigned,
        })
        .await?;

    tracing::info!(
        task_id = %request.task_id,
        worker = %worker.name,
        confidence = request.confidence,
        "Manual assignment recorded"
    );
    Ok(record)
}
