use std::path::PathBuf;

use thiserror::Error;

/// Reference configuration could not be loaded or failed validation.
///
/// Always fatal: raised before any extraction begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A rule lacks the page reference or evidence needed for traceability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvenanceError {
    #[error("rule {rule_id} has page {page}, document has {page_count} pages")]
    PageOutOfRange {
        rule_id: String,
        page: u32,
        page_count: u32,
    },

    #[error("rule {rule_id} has an empty evidence snippet")]
    EmptyEvidence { rule_id: String },

    #[error("rule {rule_id} evidence not found on page {page}")]
    EvidenceNotOnPage { rule_id: String, page: u32 },
}
