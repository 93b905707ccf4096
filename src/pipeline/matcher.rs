//! Candidate matcher: ranks the worker pool against extracted features.

use std::collections::BTreeSet;

use crate::assignments::model::Worker;
use crate::pipeline::types::{ExtractedFeatures, ScoredCandidate};

/// `2 * skill_overlap + keyword_hits` for one worker.
///
/// Skills compare case-insensitively. A keyword hits when it appears as a
/// substring of the lowercased `"{role} {responsibilities}"`; repeated
/// keywords count once.
pub fn match_score(features: &ExtractedFeatures, worker: &Worker) -> u32 {
    let worker_skills: BTreeSet<String> = worker
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    let skill_overlap = worker_skills.intersection(&features.skills).count();

    let haystack = format!("{} {}", worker.role, worker.responsibilities).to_lowercase();
    let keywords: BTreeSet<&str> = features
        .keywords
        .iter()
        .map(String::as_str)
        .filter(|k| !k.is_empty())
        .collect();
    let keyword_hits = keywords.iter().filter(|k| haystack.contains(**k)).count();

    u32::try_from(2 * skill_overlap + keyword_hits).unwrap_or(u32::MAX)
}

/// Score every worker, drop those with no signal, and rank the rest.
///
/// Order: higher score first, then lower workload. The sort is stable, so
/// full ties keep pool order.
pub fn rank(features: &ExtractedFeatures, pool: &[Worker]) -> Vec<ScoredCandidate> {
    let mut candidates: Vec<ScoredCandidate> = pool
        .iter()
        .filter_map(|worker| {
            let score = match_score(features, worker);
            (score > 0).then(|| ScoredCandidate::matched(worker.clone(), score))
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.worker.workload_score.total_cmp(&b.worker.workload_score))
    });
    candidates
}
