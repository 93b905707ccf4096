//! Workload adjuster: trades raw match quality for availability.

use serde::{Deserialize, Serialize};

use crate::pipeline::types::{ScoredCandidate, round2};

/// Weights for the availability formula
/// `adjusted = max(0, 1 - workload) * availability_weight + baseline`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadPolicy {
    pub availability_weight: f64,
    /// Floor every matched candidate receives regardless of load.
    pub baseline: f64,
}

impl Default for WorkloadPolicy {
    fn default() -> Self {
        Self {
            availability_weight: 0.6,
            baseline: 0.4,
        }
    }
}

impl WorkloadPolicy {
    /// Adjusted score for a given workload, rounded to two decimals.
    ///
    /// Workloads above 1.0 clamp availability to zero.
    pub fn adjusted_score(&self, workload: f64) -> f64 {
        let availability = (1.0 - workload).max(0.0);
        round2(availability * self.availability_weight + self.baseline)
    }
}

/// Fill in `adjusted_score` and reorder by it, descending.
///
/// The sort is stable, so equal scores keep the matcher's order.
pub fn adjust(mut candidates: Vec<ScoredCandidate>, policy: &WorkloadPolicy) -> Vec<ScoredCandidate> {
    for candidate in &mut candidates {
        candidate.adjusted_score = policy.adjusted_score(candidate.worker.workload_score);
    }
    candidates.sort_by(|a, b| b.adjusted_score.total_cmp(&a.adjusted_score));
    candidates
}
