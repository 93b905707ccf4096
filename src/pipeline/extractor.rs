//! Feature extractor: free text → [`ExtractedFeatures`].

use crate::assignments::model::WorkItem;
use crate::pipeline::types::{ExtractedFeatures, MAX_KEYWORDS};
use crate::reasoning::ReasoningBackend;

/// Extract features, falling back to [`fallback_features`] on any backend error.
pub async fn extract(backend: &dyn ReasoningBackend, task: &WorkItem) -> ExtractedFeatures {
    match backend.extract_features(task).await {
        Ok(features) => {
            let features = features.normalized();
            tracing::debug!(
                task_id = %task.id,
                backend = backend.name(),
                keywords = features.keywords.len(),
                skills = features.skills.len(),
                "Features extracted"
            );
            features
        }
        Err(e) => {
            tracing::info!(
                task_id = %task.id,
                backend = backend.name(),
                error = %e,
                "Feature extraction fell back to tokenization"
            );
            fallback_features(&task.title, &task.description)
        }
    }
}

/// The first [`MAX_KEYWORDS`] lowercased whitespace tokens of `title + " " + description`.
pub fn fallback_features(title: &str, description: &str) -> ExtractedFeatures {
    let text = format!("{title} {description}").to_lowercase();
    ExtractedFeatures {
        keywords: text
            .split_whitespace()
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect(),
        ..Default::default()
    }
}
