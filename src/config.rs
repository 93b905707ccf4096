//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::pipeline::workload::WorkloadPolicy;

/// Default minimum confidence for automatic assignment.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Pipeline configuration, passed explicitly to the orchestrator.
#[derive(Debug, Clone)]
pub struct AssignmentConfig {
    /// Minimum confidence for committing without human review.
    pub threshold: f64,
    /// Per-call timeout for the reasoning backend. Timeouts count as backend failures.
    pub backend_timeout: Duration,
    /// Availability weighting used by the workload adjuster.
    pub workload: WorkloadPolicy,
    /// Base URL of the task UI; deep links are `{base}/tasks/{id}`.
    pub task_url_base: Option<String>,
    /// Whether to notify assignees after an automatic commit.
    pub notifications_enabled: bool,
    /// Name shown as the assigner in notifications.
    pub assigned_by: String,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            backend_timeout: Duration::from_secs(30),
            workload: WorkloadPolicy::default(),
            task_url_base: None,
            notifications_enabled: true,
            assigned_by: "AI Task Engine".to_string(),
        }
    }
}

impl AssignmentConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let threshold = env_parse::<f64>("AI_ASSIGN_THRESHOLD")?.unwrap_or(defaults.threshold);
        validate_unit("AI_ASSIGN_THRESHOLD", threshold)?;

        let backend_timeout = env_parse::<u64>("AI_ASSIGN_BACKEND_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.backend_timeout);

        let availability_weight = env_parse::<f64>("AI_ASSIGN_AVAILABILITY_WEIGHT")?
            .unwrap_or(defaults.workload.availability_weight);
        validate_unit("AI_ASSIGN_AVAILABILITY_WEIGHT", availability_weight)?;
        let baseline = env_parse::<f64>("AI_ASSIGN_WORKLOAD_BASELINE")?
            .unwrap_or(defaults.workload.baseline);
        validate_unit("AI_ASSIGN_WORKLOAD_BASELINE", baseline)?;

        let task_url_base = std::env::var("AI_ASSIGN_FRONTEND_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let notifications_enabled =
            env_parse::<bool>("AI_ASSIGN_NOTIFICATIONS")?.unwrap_or(defaults.notifications_enabled);

        Ok(Self {
            threshold,
            backend_timeout,
            workload: WorkloadPolicy {
                availability_weight,
                baseline,
            },
            task_url_base,
            notifications_enabled,
            assigned_by: defaults.assigned_by,
        })
    }

    /// Deep link to a task, if a frontend URL is configured.
    pub fn task_url(&self, task_id: uuid::Uuid) -> Option<String> {
        self.task_url_base
            .as_ref()
            .map(|base| format!("{base}/tasks/{task_id}"))
    }
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn validate_unit(key: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value} is outside [0, 1]"),
        })
    }
}
