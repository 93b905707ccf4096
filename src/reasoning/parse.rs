//! Schema validation for untrusted backend replies.
//!
//! Both parsers follow the same two tiers:
//! 1. The whole reply is valid JSON → validate it against the schema.
//! 2. Otherwise locate the outermost `{…}` fragment and validate that.
//!
//! A reply with no fragment at all is [`BackendError::NoPayload`]; a value
//! that was found but fails the schema is [`BackendError::ParseFailed`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::BackendError;
use crate::pipeline::types::{EffortLevel, ExtractedFeatures};
use crate::reasoning::{ConfidenceVerdict, NEUTRAL_CONFIDENCE};

/// Greedy first-`{` to last-`}` match, across newlines.
static OBJECT_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object fragment regex is valid"));

/// Feature-extraction reply shape. Nulls and missing fields mean empty.
#[derive(Debug, Deserialize)]
struct FeaturesReply {
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    skills: Option<Vec<String>>,
    #[serde(default)]
    technical_tags: Option<Vec<String>>,
    #[serde(default)]
    effort_level: Option<String>,
}

/// Confidence reply shape.
#[derive(Debug, Deserialize)]
struct ConfidenceReply {
    #[serde(default = "neutral_confidence")]
    confidence: f64,
    #[serde(default = "no_reason")]
    reason: String,
}

fn neutral_confidence() -> f64 {
    NEUTRAL_CONFIDENCE
}

fn no_reason() -> String {
    "No reason provided".to_string()
}

/// Parse a feature-extraction reply.
pub fn parse_features(raw: &str) -> Result<ExtractedFeatures, BackendError> {
    let value = locate_payload(raw)?;
    let reply: FeaturesReply = from_object(value)?;

    let effort_level = match reply.effort_level.as_deref().map(str::to_lowercase).as_deref() {
        Some("low") => EffortLevel::Low,
        Some("high") => EffortLevel::High,
        _ => EffortLevel::Medium,
    };

    Ok(ExtractedFeatures {
        keywords: reply.keywords.unwrap_or_default(),
        skills: reply.skills.unwrap_or_default().into_iter().collect(),
        technical_tags: reply.technical_tags.unwrap_or_default().into_iter().collect(),
        effort_level,
    }
    .normalized())
}

/// Parse a confidence reply. The confidence is clamped to [0, 1].
pub fn parse_confidence(raw: &str) -> Result<ConfidenceVerdict, BackendError> {
    let value = locate_payload(raw)?;
    let reply: ConfidenceReply = from_object(value)?;

    if !reply.confidence.is_finite() {
        return Err(BackendError::ParseFailed(format!(
            "confidence is not finite: {}",
            reply.confidence
        )));
    }

    Ok(ConfidenceVerdict {
        confidence: reply.confidence.clamp(0.0, 1.0),
        reason: reply.reason,
    })
}

/// Find the JSON value carried by a reply.
fn locate_payload(raw: &str) -> Result<Value, BackendError> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let fragment = OBJECT_FRAGMENT
        .find(trimmed)
        .ok_or(BackendError::NoPayload)?;
    serde_json::from_str::<Value>(fragment.as_str())
        .map_err(|e| BackendError::ParseFailed(format!("embedded object is not JSON: {e}")))
}

fn from_object<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    if !value.is_object() {
        return Err(BackendError::ParseFailed(format!(
            "expected a JSON object, got {value}"
        )));
    }
    serde_json::from_value(value).map_err(|e| BackendError::ParseFailed(e.to_string()))
}
