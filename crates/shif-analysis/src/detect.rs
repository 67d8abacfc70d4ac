//! Contradiction detection.
//!
//! Rules are clustered into [`ServiceGroup`]s by normalized service name, then
//! every pair inside a group is compared on tariff, frequency, coverage and
//! payment mechanism. Each disagreement yields one [`Contradiction`].

use std::collections::HashSet;

use shif_core::config::DetectionSettings;
use shif_core::{
    AnalyzerConfig, Contradiction, ContradictionKind, ExtractedRule, Frequency,
    normalize_service_name,
};
use tracing::{debug, info};

use crate::similarity::{contains_either, token_sort_ratio};

/// Scores closer than this are a tie.
const SCORE_EPSILON: f64 = 1e-9;

/// Rules judged to name the same service. Lives only for one detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceGroup {
    /// Normalized name of the first member.
    pub canonical: String,
    /// Indices into the rule slice, in rule order.
    pub members: Vec<usize>,
    pub threshold: f64,
}

/// Cluster rules in order. A rule joins the existing group whose canonical
/// name scores highest (at least `threshold`); equal scores prefer a group
/// whose name contains or is contained in the rule's, then the older group.
/// Rules without a nameable service are left out.
pub fn group_services(rules: &[ExtractedRule], threshold: f64) -> Vec<ServiceGroup> {
    let mut groups: Vec<ServiceGroup> = Vec::new();

    for (idx, rule) in rules.iter().enumerate() {
        let Some(name) = rule.service_name.as_deref() else {
            continue;
        };
        let normalized = normalize_service_name(name);
        if normalized.is_empty() {
            continue;
        }

        let mut best: Option<(usize, f64, bool)> = None;
        for (g, group) in groups.iter().enumerate() {
            let score = token_sort_ratio(&group.canonical, &normalized);
            if score < threshold {
                continue;
            }
            let contains = contains_either(&group.canonical, &normalized);
            let better = match best {
                None => true,
                Some((_, best_score, best_contains)) => {
                    score > best_score + SCORE_EPSILON
                        || ((score - best_score).abs() <= SCORE_EPSILON && contains && !best_contains)
                }
            };
            if better {
                best = Some((g, score, contains));
            }
        }

        match best {
            Some((g, _, _)) => groups[g].members.push(idx),
            None => groups.push(ServiceGroup {
                canonical: normalized,
                members: vec![idx],
                threshold,
            }),
        }
    }

    debug!(groups = groups.len(), "grouped services");
    groups
}

/// Compare every pair of rules inside each service group.
///
/// Contradictions are numbered `C0001`, ... in group order, then pair order.
/// `rule_a` is always the earlier rule.
pub fn detect_contradictions(rules: &[ExtractedRule], config: &AnalyzerConfig) -> Vec<Contradiction> {
    let settings = &config.detection;
    let groups = group_services(rules, settings.similarity_threshold);

    let mut seen: HashSet<(&str, &str, ContradictionKind)> = HashSet::new();
    let mut found = Vec::new();

    for group in groups.iter().filter(|g| g.members.len() > 1) {
        for (i, &ia) in group.members.iter().enumerate() {
            for &ib in &group.members[i + 1..] {
                let (a, b) = (&rules[ia], &rules[ib]);
                for (kind, description) in compare(a, b, settings) {
                    let key = ordered_key(&a.id, &b.id, kind);
                    if !seen.insert(key) {
                        continue;
                    }
                    found.push(Contradiction {
                        id: String::new(),
                        kind,
                        rule_a: a.id.clone(),
                        rule_b: b.id.clone(),
                        description,
                        confidence: pair_confidence(a, b),
                    });
                }
            }
        }
    }

    for (i, c) in found.iter_mut().enumerate() {
        c.id = format!("C{:04}", i + 1);
    }
    info!(
        rules = rules.len(),
        contradictions = found.len(),
        "contradiction detection complete"
    );
    found
}

fn ordered_key<'a>(a: &'a str, b: &'a str, kind: ContradictionKind) -> (&'a str, &'a str, ContradictionKind) {
    if a <= b { (a, b, kind) } else { (b, a, kind) }
}

/// Every attribute on which `a` and `b` disagree, with a description.
fn compare(
    a: &ExtractedRule,
    b: &ExtractedRule,
    settings: &DetectionSettings,
) -> Vec<(ContradictionKind, String)> {
    let name = a.service_name.as_deref().unwrap_or_default();
    let mut out = Vec::new();

    if let (Some(ta), Some(tb)) = (&a.tariff, &b.tariff)
        && let (Some(amount_a), Some(amount_b)) = (ta.amount, tb.amount)
        && (ta.currency != tb.currency || amount_a.abs_diff(amount_b) > settings.tariff_tolerance)
    {
        out.push((
            ContradictionKind::Tariff,
            format!(
                "{name}: {} {amount_a}{} vs {} {amount_b}{}",
                ta.currency,
                located(a),
                tb.currency,
                located(b)
            ),
        ));
    }

    if let (Some(fa), Some(fb)) = (&a.frequency, &b.frequency)
        && frequencies_disagree(fa, fb, settings.frequency_tolerance)
    {
        out.push((
            ContradictionKind::Limit,
            format!("{name}: {fa}{} vs {fb}{}", located(a), located(b)),
        ));
    }

    if a.coverage.conflicts_with(b.coverage) {
        let kind = match (a.facility_level, b.facility_level) {
            (Some(la), Some(lb)) if la != lb => ContradictionKind::Facility,
            _ => ContradictionKind::Coverage,
        };
        out.push((
            kind,
            format!(
                "{name}: {}{} vs {}{}",
                a.coverage.as_str(),
                located(a),
                b.coverage.as_str(),
                located(b)
            ),
        ));
    }

    if a.payment.is_specified() && b.payment.is_specified() && a.payment != b.payment {
        out.push((
            ContradictionKind::Payment,
            format!(
                "{name}: {}{} vs {}{}",
                a.payment.as_str(),
                located(a),
                b.payment.as_str(),
                located(b)
            ),
        ));
    }

    out
}

/// Unit and period must agree when both are stated; caps may differ by at
/// most `tolerance`.
fn frequencies_disagree(a: &Frequency, b: &Frequency, tolerance: u32) -> bool {
    if a.unit != b.unit {
        return true;
    }
    if let (Some(pa), Some(pb)) = (&a.period, &b.period)
        && pa != pb
    {
        return true;
    }
    matches!((a.count, b.count), (Some(ca), Some(cb)) if ca.abs_diff(cb) > tolerance)
}

/// ` at level 4 (p.12)` or ` (p.12)`.
fn located(rule: &ExtractedRule) -> String {
    match rule.facility_level {
        Some(level) => format!(" at level {level} (p.{})", rule.page),
        None => format!(" (p.{})", rule.page),
    }
}

/// Name similarity times the mean confidence weight of the two rules,
/// rounded to three decimals.
fn pair_confidence(a: &ExtractedRule, b: &ExtractedRule) -> f32 {
    let similarity = token_sort_ratio(
        &normalize_service_name(a.service_name.as_deref().unwrap_or_default()),
        &normalize_service_name(b.service_name.as_deref().unwrap_or_default()),
    ) as f32;
    let weight = (a.confidence.weight() + b.confidence.weight()) / 2.0;
    ((similarity * weight) * 1000.0).round() / 1000.0
}
