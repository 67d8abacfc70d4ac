//! Detector and analyzer outputs: contradictions between rules and coverage gaps.

use serde::{Deserialize, Serialize};

/// Monitored attribute on which two rules disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    /// Different currency or amount for the same service.
    Tariff,
    /// Different billing unit, period or frequency cap.
    Limit,
    /// Included vs excluded at the same (or an unspecified) facility level.
    Coverage,
    /// Included vs excluded at two different explicit facility levels.
    Facility,
    /// Different payment mechanisms.
    Payment,
}

impl ContradictionKind {
    pub const ALL: [ContradictionKind; 5] = [
        Self::Tariff,
        Self::Limit,
        Self::Coverage,
        Self::Facility,
        Self::Payment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tariff => "tariff",
            Self::Limit => "limit",
            Self::Coverage => "coverage",
            Self::Facility => "facility",
            Self::Payment => "payment",
        }
    }
}

/// Two rules for the same service that disagree on one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub id: String,
    pub kind: ContradictionKind,
    /// Rule ids, `rule_a` always the earlier rule in document order.
    pub rule_a: String,
    pub rule_b: String,
    pub description: String,
    /// 0.0 to 1.0.
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSubtype {
    /// Disease mentioned but no rule names one of its treatments.
    DiseaseTreatmentMismatch,
    /// Disease neither mentioned nor treated anywhere in the document.
    NoCoverageFound,
    /// A reference service has no matching rule.
    MissingExpectedService,
    /// A facility level maps fewer distinct services than its minimum.
    FacilityLevelShortfall,
}

impl GapSubtype {
    pub const ALL: [GapSubtype; 4] = [
        Self::DiseaseTreatmentMismatch,
        Self::NoCoverageFound,
        Self::MissingExpectedService,
        Self::FacilityLevelShortfall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiseaseTreatmentMismatch => "disease_treatment_mismatch",
            Self::NoCoverageFound => "no_coverage_found",
            Self::MissingExpectedService => "missing_expected_service",
            Self::FacilityLevelShortfall => "facility_level_shortfall",
        }
    }
}

/// A disease, expected service or facility level lacking coverage rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub id: String,
    pub subtype: GapSubtype,
    pub name: String,
    pub mention_count: usize,
    pub treatment_match_count: usize,
    /// Ascending, deduplicated.
    pub evidence_pages: Vec<u32>,
}

impl Gap {
    /// `1;4;7` form used in the tabular report.
    pub fn evidence_pages_joined(&self) -> String {
        self.evidence_pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(";")
    }
}
