//! `Database` trait: the single async interface for assignment persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::assignments::model::{AssignmentDecisionRecord, DecisionStatus, WorkItem, Worker};
use crate::error::DatabaseError;

/// Everything a committing decision writes, applied as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentCommit {
    pub task_id: Uuid,
    pub worker_id: Uuid,
    /// Stored both on the work item and on the audit record.
    pub confidence: f64,
    pub rationale: String,
    pub decision_status: DecisionStatus,
}

/// Backend-agnostic persistence for work items, workers, and the decision log.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Workers ─────────────────────────────────────────────────────

    /// Insert or replace a worker.
    async fn insert_worker(&self, worker: &Worker) -> Result<(), DatabaseError>;

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>, DatabaseError>;

    /// Snapshot of the whole pool, in insertion order.
    async fn list_workers(&self) -> Result<Vec<Worker>, DatabaseError>;

    // ── Work items ──────────────────────────────────────────────────

    async fn insert_task(&self, task: &WorkItem) -> Result<(), DatabaseError>;

    async fn get_task(&self, id: Uuid) -> Result<Option<WorkItem>, DatabaseError>;

    // ── Decisions ───────────────────────────────────────────────────

    /// Set the assignee, `assigned` status and confidence on the task and
    /// append the audit record, atomically. Concurrent commits are serialized.
    ///
    /// Returns `DatabaseError::NotFound` when the task does not exist; in that
    /// case nothing is written.
    async fn commit_assignment(
        &self,
        commit: &AssignmentCommit,
    ) -> Result<AssignmentDecisionRecord, DatabaseError>;

    /// Append a non-committing audit record (e.g. `no_candidates`).
    async fn append_decision(&self, record: &AssignmentDecisionRecord) -> Result<(), DatabaseError>;

    /// Audit trail for a task, newest first.
    async fn list_decisions(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<AssignmentDecisionRecord>, DatabaseError>;
}
