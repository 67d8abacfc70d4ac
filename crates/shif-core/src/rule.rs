//! Extracted tariff rules.
//!
//! An [`ExtractedRule`] is one policy statement found on a page: a priced
//! service, an exclusion, or a frequency limit. Every rule keeps the page it
//! came from and a verbatim evidence snippet so it can be traced back to the
//! source document.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProvenanceError;

/// Extraction confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Tier from the number of key fields (service name, amount, facility
    /// level) that resolved.
    pub fn from_resolved(resolved: usize) -> Self {
        match resolved {
            3.. => Self::High,
            2 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Numeric weight used when scoring contradictions.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Low => 0.4,
            Self::Medium => 0.7,
            Self::High => 1.0,
        }
    }
}

/// Whether the statement includes or excludes the service from cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Included,
    Excluded,
    Unspecified,
}

impl Coverage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Included => "included",
            Self::Excluded => "excluded",
            Self::Unspecified => "unspecified",
        }
    }

    /// Outright contradiction: one side includes, the other excludes.
    pub fn conflicts_with(self, other: Coverage) -> bool {
        matches!(
            (self, other),
            (Self::Included, Self::Excluded) | (Self::Excluded, Self::Included)
        )
    }
}

/// Provider payment mechanism named alongside the tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMechanism {
    FeeForService,
    Capitation,
    CaseBased,
    GlobalBudget,
    Unspecified,
}

impl PaymentMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeeForService => "fee_for_service",
            Self::Capitation => "capitation",
            Self::CaseBased => "case_based",
            Self::GlobalBudget => "global_budget",
            Self::Unspecified => "unspecified",
        }
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

/// A priced amount. `amount` is `None` when a currency marker was found but
/// the figure could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tariff {
    pub currency: String,
    pub amount: Option<u64>,
}

impl Tariff {
    pub fn known(currency: impl Into<String>, amount: u64) -> Self {
        Self {
            currency: currency.into(),
            amount: Some(amount),
        }
    }

    pub fn unknown(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            amount: None,
        }
    }
}

/// Billing unit and optional frequency cap, e.g. `per session` or
/// `3 session per week`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frequency {
    /// Maximum count per period, when the text states a cap.
    pub count: Option<u32>,
    /// Singular unit: `session`, `visit`, `day`, ...
    pub unit: String,
    pub period: Option<String>,
}

impl Frequency {
    pub fn per_unit(unit: impl Into<String>) -> Self {
        Self {
            count: None,
            unit: unit.into(),
            period: None,
        }
    }

    pub fn limit(count: u32, unit: impl Into<String>, period: Option<String>) -> Self {
        Self {
            count: Some(count),
            unit: unit.into(),
            period,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.count, &self.period) {
            (Some(c), Some(p)) => write!(f, "{c} {} per {p}", self.unit),
            (Some(c), None) => write!(f, "{c} {}", self.unit),
            (None, Some(p)) => write!(f, "per {} per {p}", self.unit),
            (None, None) => write!(f, "per {}", self.unit),
        }
    }
}

/// Where on the page the rule was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    Text,
    Table,
}

/// One policy statement extracted from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRule {
    /// Stable id (`R0001`, ...) assigned in page-then-discovery order.
    pub id: String,
    pub service_name: Option<String>,
    /// Kenyan facility tier, 1 to 6.
    pub facility_level: Option<u8>,
    pub tariff: Option<Tariff>,
    pub frequency: Option<Frequency>,
    pub coverage: Coverage,
    pub payment: PaymentMechanism,
    /// 1-based source page.
    pub page: u32,
    /// Verbatim substring of the page text.
    pub evidence: String,
    pub confidence: Confidence,
    pub source: RuleSource,
}

impl ExtractedRule {
    /// Parsed tariff amount, if any.
    pub fn amount(&self) -> Option<u64> {
        self.tariff.as_ref().and_then(|t| t.amount)
    }

    pub fn currency(&self) -> Option<&str> {
        self.tariff.as_ref().map(|t| t.currency.as_str())
    }

    /// How many of service name, amount and facility level resolved.
    pub fn resolved_fields(&self) -> usize {
        [
            self.service_name.is_some(),
            self.amount().is_some(),
            self.facility_level.is_some(),
        ]
        .iter()
        .filter(|&&b| b)
        .count()
    }

    /// Recompute the confidence tier from the resolved fields.
    pub fn rescore(&mut self) {
        self.confidence = Confidence::from_resolved(self.resolved_fields());
    }

    /// Check the traceability contract: a page inside the document and a
    /// non-empty evidence snippet that occurs verbatim on that page.
    pub fn check_provenance(
        &self,
        page_count: u32,
        page_text: Option<&str>,
    ) -> Result<(), ProvenanceError> {
        if self.page == 0 || self.page > page_count {
            return Err(ProvenanceError::PageOutOfRange {
                rule_id: self.id.clone(),
                page: self.page,
                page_count,
            });
        }
        if self.evidence.trim().is_empty() {
            return Err(ProvenanceError::EmptyEvidence {
                rule_id: self.id.clone(),
            });
        }
        match page_text {
            Some(text) if text.contains(&self.evidence) => Ok(()),
            _ => Err(ProvenanceError::EvidenceNotOnPage {
                rule_id: self.id.clone(),
                page: self.page,
            }),
        }
    }
}
