//! Capability interface for external text classification.
//!
//! The classifier is an untrusted, unreliable collaborator: it may be slow,
//! rate-limited or wrong. Callers go through [`classify_with_retry`] and treat
//! every error as a reason to fall back to the pattern-only rule.
//!
//! [`classify_with_retry`]: crate::retry::classify_with_retry

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured fields a classifier may recover from an evidence snippet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierFields {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub facility_level: Option<u8>,
    #[serde(default)]
    pub amount: Option<u64>,
    /// 0.0 to 1.0, as reported by the classifier.
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    /// Network, rate-limit or server failure worth retrying.
    #[error("transient classifier failure: {0}")]
    Transient(String),

    /// Request rejected; retrying will not help.
    #[error("classifier rejected request: {0}")]
    Permanent(String),

    #[error("unparseable classifier response: {0}")]
    BadResponse(String),

    #[error("classifier unavailable after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl ClassifyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transient(_))
    }
}

/// `summarize_or_classify(text) -> structured_fields`.
#[async_trait]
pub trait Classify: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> Result<ClassifierFields, ClassifyError>;
}

/// Parse a classifier's JSON answer, tolerating Markdown code fences.
pub fn parse_fields(raw: &str) -> Result<ClassifierFields, ClassifyError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let fields: ClassifierFields = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        ClassifyError::BadResponse(format!("{e}; raw: {preview}"))
    })?;

    if !(0.0..=1.0).contains(&fields.confidence) {
        return Err(ClassifyError::BadResponse(format!(
            "confidence {} outside [0, 1]",
            fields.confidence
        )));
    }
    Ok(fields)
}
