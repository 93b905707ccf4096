//! Assignment data model: work items, workers and the decision audit trail.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: '{other}'")),
        }
    }
}

/// Work item lifecycle: open → assigned → in_progress / review / done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Open,
    Assigned,
    InProgress,
    Review,
    Done,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl FromStr for WorkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown work status: '{other}'")),
        }
    }
}

/// A unit of work to be assigned.
///
/// `confidence_score` is set only by an assignment decision (automatic or
/// manual); it stays `None` while the item has never been assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: WorkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Create an open, unassigned work item.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            priority: Priority::default(),
            status: WorkStatus::Open,
            assignee_id: None,
            confidence_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: set priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// A person eligible to receive work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    /// Skill tags. Matched case-insensitively.
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub responsibilities: String,
    /// Current load in [0.0, 1.0]; 0 is idle. Maintained outside the pipeline.
    #[serde(default)]
    pub workload_score: f64,
}

impl Worker {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
            skills: Vec::new(),
            responsibilities: String::new(),
            workload_score: 0.0,
        }
    }

    /// Builder: set skill tags.
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set responsibilities text.
    pub fn with_responsibilities(mut self, text: impl Into<String>) -> Self {
        self.responsibilities = text.into();
        self
    }

    /// Builder: set workload score.
    pub fn with_workload(mut self, workload_score: f64) -> Self {
        self.workload_score = workload_score;
        self
    }
}

/// Terminal outcome tag stored on an audit record.
///
/// Unknown tags read back from storage are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DecisionStatus {
    AutoAssigned,
    NoCandidates,
    ManagerAssigned,
    Other(String),
}

impl DecisionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AutoAssigned => "auto_assigned",
            Self::NoCandidates => "no_candidates",
            Self::ManagerAssigned => "manager_assigned",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for DecisionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "auto_assigned" => Self::AutoAssigned,
            "no_candidates" => Self::NoCandidates,
            "manager_assigned" => Self::ManagerAssigned,
            _ => Self::Other(s),
        }
    }
}

impl From<DecisionStatus> for String {
    fn from(status: DecisionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit entry for one decision event. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDecisionRecord {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Worker the decision assigned, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<Uuid>,
    pub reasoning_text: String,
    pub confidence: f64,
    pub decision_status: DecisionStatus,
    pub created_at: DateTime<Utc>,
}

impl AssignmentDecisionRecord {
    pub fn new(
        task_id: Uuid,
        worker_id: Option<Uuid>,
        reasoning_text: impl Into<String>,
        confidence: f64,
        decision_status: DecisionStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            worker_id,
            reasoning_text: reasoning_text.into(),
            confidence,
            decision_status,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_work_item_defaults() {
        let item = WorkItem::new("Build REST API", "for invoices");
        assert_eq!(item.status, WorkStatus::Open);
        assert_eq!(item.priority, Priority::Medium);
        assert!(item.assignee_id.is_none());
        assert!(item.confidence_score.is_none());
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn work_status_serde_snake_case() {
        let json = serde_json::to_value(WorkStatus::InProgress).unwrap();
        assert_eq!(json, "in_progress");
        assert_eq!("in_progress".parse::<WorkStatus>().unwrap(), WorkStatus::InProgress);
        assert!("archived".parse::<WorkStatus>().is_err());
    }

    #[test]
    fn priority_round_trips_through_str() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
    }

    #[test]
    fn decision_status_keeps_unknown_tags() {
        let status = DecisionStatus::from("escalated".to_string());
        assert_eq!(status, DecisionStatus::Other("escalated".into()));
        assert_eq!(status.as_str(), "escalated");

        let json = serde_json::to_value(DecisionStatus::ManagerAssigned).unwrap();
        assert_eq!(json, "manager_assigned");
        let back: DecisionStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, DecisionStatus::ManagerAssigned);
    }

    #[test]
    fn worker_builder_sets_fields() {
        let w = Worker::new("Dhruv", "dhruv@example.com", "Backend Engineer")
            .with_skills(["python", "api"])
            .with_responsibilities("Owns billing services")
            .with_workload(0.2);
        assert_eq!(w.skills, vec!["python", "api"]);
        assert_eq!(w.responsibilities, "Owns billing services");
        assert!((w.workload_score - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn worker_deserializes_with_missing_optional_fields() {
        let w: Worker = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "name": "Manaal",
            "email": "manaal@example.com",
            "role": "PM"
        }))
        .unwrap();
        assert!(w.skills.is_empty());
        assert_eq!(w.workload_score, 0.0);
    }
}
