//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::assignments::model::{
    AssignmentDecisionRecord, DecisionStatus, Priority, WorkItem, WorkStatus, Worker,
};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{AssignmentCommit, Database};

const WORKER_COLUMNS: &str = "id, name, email, role, skills, responsibilities, workload_score";
const TASK_COLUMNS: &str =
    "id, title, description, priority, status, assignee_id, confidence_score, created_at, updated_at";
const DECISION_COLUMNS: &str =
    "id, task_id, worker_id, reasoning_text, confidence, decision_status, created_at";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// Every operation takes `conn_lock`, so a plain insert can never land
/// inside an open assignment transaction and vanish with its rollback, and
/// reads never see a transaction's uncommitted rows. The lock
/// covers this backend only; backends opened separately on the same file
/// rely on SQLite's own write locking.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    conn_lock: Mutex<()>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            conn_lock: Mutex::new(()),
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_uuid(s: &str, column: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Serialization(format!("{column} '{s}': {e}")))
}

fn opt_uuid(id: Option<Uuid>) -> libsql::Value {
    match id {
        Some(id) => libsql::Value::Text(id.to_string()),
        None => libsql::Value::Null,
    }
}

fn opt_real(v: Option<f64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Real(v),
        None => libsql::Value::Null,
    }
}

fn row_to_worker(row: &libsql::Row) -> Result<Worker, DatabaseError> {
    let get = |e: libsql::Error| DatabaseError::Query(format!("worker row parse: {e}"));
    let id: String = row.get(0).map_err(get)?;
    let skills_json: String = row.get::<String>(4).unwrap_or_else(|_| "[]".into());
    let skills: Vec<String> = serde_json::from_str(&skills_json)
        .map_err(|e| DatabaseError::Serialization(format!("worker skills: {e}")))?;

    Ok(Worker {
        id: parse_uuid(&id, "workers.id")?,
        name: row.get(1).map_err(get)?,
        email: row.get(2).map_err(get)?,
        role: row.get(3).map_err(get)?,
        skills,
        responsibilities: row.get::<String>(5).unwrap_or_default(),
        workload_score: row.get::<f64>(6).unwrap_or(0.0),
    })
}

fn row_to_task(row: &libsql::Row) -> Result<WorkItem, DatabaseError> {
    let get = |e: libsql::Error| DatabaseError::Query(format!("work item row parse: {e}"));
    let id: String = row.get(0).map_err(get)?;
    let priority: String = row.get(3).map_err(get)?;
    let status: String = row.get(4).map_err(get)?;
    let assignee: Option<String> = row.get::<String>(5).ok();
    let created: String = row.get(7).map_err(get)?;
    let updated: String = row.get(8).map_err(get)?;

    Ok(WorkItem {
        id: parse_uuid(&id, "work_items.id")?,
        title: row.get(1).map_err(get)?,
        description: row.get::<String>(2).unwrap_or_default(),
        priority: priority.parse::<Priority>().map_err(DatabaseError::Serialization)?,
        status: status.parse::<WorkStatus>().map_err(DatabaseError::Serialization)?,
        assignee_id: assignee
            .as_deref()
            .map(|s| parse_uuid(s, "work_items.assignee_id"))
            .transpose()?,
        confidence_score: row.get::<f64>(6).ok(),
        created_at: parse_datetime(&created),
        updated_at: parse_datetime(&updated),
    })
}

fn row_to_decision(row: &libsql::Row) -> Result<AssignmentDecisionRecord, DatabaseError> {
    let get = |e: libsql::Error| DatabaseError::Query(format!("decision row parse: {e}"));
    let id: String = row.get(0).map_err(get)?;
    let task_id: String = row.get(1).map_err(get)?;
    let worker_id: Option<String> = row.get::<String>(2).ok();
    let status: String = row.get(5).map_err(get)?;
    let created: String = row.get(6).map_err(get)?;

    Ok(AssignmentDecisionRecord {
        id: parse_uuid(&id, "assignment_decisions.id")?,
        task_id: parse_uuid(&task_id, "assignment_decisions.task_id")?,
        worker_id: worker_id
            .as_deref()
            .map(|s| parse_uuid(s, "assignment_decisions.worker_id"))
            .transpose()?,
        reasoning_text: row.get(3).map_err(get)?,
        confidence: row.get(4).map_err(get)?,
        decision_status: DecisionStatus::from(status),
        created_at: parse_datetime(&created),
    })
}

const INSERT_DECISION: &str = "INSERT INTO assignment_decisions (id, task_id, worker_id, reasoning_text, confidence, decision_status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

fn decision_params(record: &AssignmentDecisionRecord) -> Vec<libsql::Value> {
    vec![
        libsql::Value::Text(record.id.to_string()),
        libsql::Value::Text(record.task_id.to_string()),
        opt_uuid(record.worker_id),
        libsql::Value::Text(record.reasoning_text.clone()),
        libsql::Value::Real(record.confidence),
        libsql::Value::Text(record.decision_status.to_string()),
        libsql::Value::Text(record.created_at.to_rfc3339()),
    ]
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        migrations::run_migrations(self.conn()).await
    }

    // ── Workers ─────────────────────────────────────────────────────

    async fn insert_worker(&self, worker: &Worker) -> Result<(), DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        let skills = serde_json::to_string(&worker.skills)
            .map_err(|e| DatabaseError::Serialization(format!("worker skills: {e}")))?;

        self.conn()
            .execute(
                "INSERT OR REPLACE INTO workers (id, name, email, role, skills, responsibilities, workload_score) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    worker.id.to_string(),
                    worker.name.as_str(),
                    worker.email.as_str(),
                    worker.role.as_str(),
                    skills,
                    worker.responsibilities.as_str(),
                    worker.workload_score,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_worker: {e}")))?;

        debug!(worker_id = %worker.id, name = %worker.name, "Worker saved");
        Ok(())
    }

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>, DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {WORKER_COLUMNS} FROM workers WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_worker: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_worker(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_worker: {e}"))),
        }
    }

    async fn list_workers(&self) -> Result<Vec<Worker>, DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {WORKER_COLUMNS} FROM workers ORDER BY rowid"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_workers: {e}")))?;

        let mut workers = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => workers.push(row_to_worker(&row)?),
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("list_workers: {e}"))),
            }
        }
        Ok(workers)
    }

    // ── Work items ──────────────────────────────────────────────────

    async fn insert_task(&self, task: &WorkItem) -> Result<(), DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        self.conn()
            .execute(
                &format!("INSERT INTO work_items ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    task.id.to_string(),
                    task.title.as_str(),
                    task.description.as_str(),
                    task.priority.as_str(),
                    task.status.as_str(),
                    opt_uuid(task.assignee_id),
                    opt_real(task.confidence_score),
                    task.created_at.to_rfc3339(),
                    task.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_task: {e}")))?;

        debug!(task_id = %task.id, title = %task.title, "Work item inserted");
        Ok(())
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<WorkItem>, DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM work_items WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_task: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_task(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_task: {e}"))),
        }
    }

    // ── Decisions ───────────────────────────────────────────────────

    async fn commit_assignment(
        &self,
        commit: &AssignmentCommit,
    ) -> Result<AssignmentDecisionRecord, DatabaseError> {
        let _guard = self.conn_lock.lock().await;

        let record = AssignmentDecisionRecord::new(
            commit.task_id,
            Some(commit.worker_id),
            commit.rationale.clone(),
            commit.confidence,
            commit.decision_status.clone(),
        );

        // Dropping the transaction on an early return rolls it back.
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("commit_assignment begin: {e}")))?;

        let updated = tx
            .execute(
                "UPDATE work_items SET assignee_id = ?1, status = ?2, confidence_score = ?3, updated_at = ?4 WHERE id = ?5",
                params![
                    commit.worker_id.to_string(),
                    WorkStatus::Assigned.as_str(),
                    commit.confidence,
                    record.created_at.to_rfc3339(),
                    commit.task_id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("commit_assignment update: {e}")))?;

        if updated == 0 {
            tx.rollback()
                .await
                .map_err(|e| DatabaseError::Query(format!("commit_assignment rollback: {e}")))?;
            return Err(DatabaseError::NotFound {
                entity: "work_item".to_string(),
                id: commit.task_id.to_string(),
            });
        }

        tx.execute(INSERT_DECISION, decision_params(&record))
            .await
            .map_err(|e| DatabaseError::Query(format!("commit_assignment audit: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Query(format!("commit_assignment commit: {e}")))?;

        debug!(
            task_id = %commit.task_id,
            worker_id = %commit.worker_id,
            status = %commit.decision_status,
            "Assignment committed"
        );
        Ok(record)
    }

    async fn append_decision(&self, record: &AssignmentDecisionRecord) -> Result<(), DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        self.conn()
            .execute(INSERT_DECISION, decision_params(record))
            .await
            .map_err(|e| DatabaseError::Query(format!("append_decision: {e}")))?;
        debug!(task_id = %record.task_id, status = %record.decision_status, "Decision recorded");
        Ok(())
    }

    async fn list_decisions(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<AssignmentDecisionRecord>, DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {DECISION_COLUMNS} FROM assignment_decisions WHERE task_id = ?1 ORDER BY created_at DESC, rowid DESC"
                ),
                params![task_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_decisions: {e}")))?;

        let mut records = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => records.push(row_to_decision(&row)?),
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("list_decisions: {e}"))),
            }
        }
        Ok(records)
    }
}
