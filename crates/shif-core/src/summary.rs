//! Aggregate counts for the end-of-run dashboard and `summary.json`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::finding::{Contradiction, ContradictionKind, Gap, GapSubtype};
use crate::rule::{Confidence, Coverage, ExtractedRule, RuleSource};
use crate::warning::{Warning, WarningKind, WarningLog};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub document: String,
    pub pages: u32,
    pub rules: usize,
    pub rules_by_confidence: BTreeMap<Confidence, usize>,
    pub rules_from_tables: usize,
    pub rules_with_unknown_amount: usize,
    pub exclusions: usize,
    pub contradictions: usize,
    pub contradictions_by_kind: BTreeMap<ContradictionKind, usize>,
    pub gaps: usize,
    pub gaps_by_subtype: BTreeMap<GapSubtype, usize>,
    pub warnings_by_kind: BTreeMap<WarningKind, usize>,
    pub warnings: Vec<Warning>,
    pub generated_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn build(
        document: &str,
        pages: u32,
        rules: &[ExtractedRule],
        contradictions: &[Contradiction],
        gaps: &[Gap],
        warnings: &WarningLog,
    ) -> Self {
        let mut rules_by_confidence = BTreeMap::new();
        for rule in rules {
            *rules_by_confidence.entry(rule.confidence).or_insert(0) += 1;
        }

        let mut contradictions_by_kind = BTreeMap::new();
        for c in contradictions {
            *contradictions_by_kind.entry(c.kind).or_insert(0) += 1;
        }

        let mut gaps_by_subtype = BTreeMap::new();
        for g in gaps {
            *gaps_by_subtype.entry(g.subtype).or_insert(0) += 1;
        }

        Self {
            document: document.to_string(),
            pages,
            rules: rules.len(),
            rules_by_confidence,
            rules_from_tables: rules
                .iter()
                .filter(|r| r.source == RuleSource::Table)
                .count(),
            rules_with_unknown_amount: rules
                .iter()
                .filter(|r| r.tariff.is_some() && r.amount().is_none())
                .count(),
            exclusions: rules
                .iter()
                .filter(|r| r.coverage == Coverage::Excluded)
                .count(),
            contradictions: contradictions.len(),
            contradictions_by_kind,
            gaps: gaps.len(),
            gaps_by_subtype,
            warnings_by_kind: warnings.counts(),
            warnings: warnings.entries().to_vec(),
            generated_at: Utc::now(),
        }
    }
}
