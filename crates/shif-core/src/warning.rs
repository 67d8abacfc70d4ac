//! Non-fatal problems collected during a run and reported at the end.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A field on a page could not be resolved; the rule was kept with lower confidence.
    Extraction,
    /// The external classifier failed after retries; the pattern-only rule was kept.
    ClassificationUnavailable,
    /// A rule failed the provenance check and was dropped before detection.
    ProvenanceRejected,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::ClassificationUnavailable => "classification_unavailable",
            Self::ProvenanceRejected => "provenance_rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub page: Option<u32>,
    pub detail: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "[{}] p.{page}: {}", self.kind.as_str(), self.detail),
            None => write!(f, "[{}] {}", self.kind.as_str(), self.detail),
        }
    }
}

/// Ordered log of warnings. Every push is also emitted through `tracing`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarningLog {
    entries: Vec<Warning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: WarningKind, page: Option<u32>, detail: impl Into<String>) {
        let detail = detail.into();
        warn!(kind = kind.as_str(), page, %detail, "non-fatal problem");
        self.entries.push(Warning { kind, page, detail });
    }

    pub fn extend(&mut self, other: WarningLog) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Warning] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count per kind, in kind order.
    pub fn counts(&self) -> BTreeMap<WarningKind, usize> {
        let mut counts = BTreeMap::new();
        for w in &self.entries {
            *counts.entry(w.kind).or_insert(0) += 1;
        }
        counts
    }
}
