//! Error types for AI Assign.

use std::time::Duration;

use uuid::Uuid;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Outcome of a reasoning-backend call that did not yield a usable value.
///
/// Every variant is recoverable: the calling stage switches to its
/// deterministic fallback. None of these reach the orchestrator's caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("no reasoning backend configured")]
    Unavailable,

    #[error("backend request failed: {0}")]
    Request(String),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend reply failed schema validation: {0}")]
    ParseFailed(String),

    #[error("backend reply contained no structured payload")]
    NoPayload,
}

/// Assignee notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build notification: {0}")]
    Build(String),

    #[error("Failed to deliver notification to {address}: {reason}")]
    SendFailed { address: String, reason: String },
}

/// Errors surfaced by `run_assignment`.
///
/// Backend trouble and empty candidate pools are not errors; they resolve
/// to fallback scores or a `no_candidates` result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Worker {0} not found")]
    WorkerNotFound(Uuid),

    #[error("Threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    #[error("Confidence {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] DatabaseError),
}
