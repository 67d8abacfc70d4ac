//! Classifier refinement of rules the patterns could not fully resolve.

use shif_ai::{Classify, ClassifierFields, ClassifyError, classify_with_retry};
use shif_core::config::FACILITY_LEVELS;
use shif_core::{AnalyzerConfig, Confidence, ExtractedRule, Tariff, WarningKind, WarningLog};
use tracing::{debug, info, warn};

/// Outcome counts for one refinement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefineStats {
    pub attempted: usize,
    pub improved: usize,
    pub ignored: usize,
    pub unavailable: usize,
}

/// Ask the classifier about every rule below [`Confidence::High`], one at a
/// time, and fill the fields the patterns left empty.
///
/// Answers below `min_confidence` are ignored. Any failure keeps the
/// pattern-only rule and records a `ClassificationUnavailable` warning. A
/// permanent rejection (bad key, bad request) stops further calls for the
/// rest of the run.
pub async fn refine_rules(
    rules: &mut [ExtractedRule],
    classifier: &dyn Classify,
    config: &AnalyzerConfig,
    warnings: &mut WarningLog,
) -> RefineStats {
    let policy = &config.classifier;
    let mut stats = RefineStats::default();
    let mut disabled: Option<String> = None;

    for rule in rules.iter_mut().filter(|r| r.confidence < Confidence::High) {
        if let Some(reason) = &disabled {
            stats.unavailable += 1;
            warnings.push(
                WarningKind::ClassificationUnavailable,
                Some(rule.page),
                format!("{}: classifier disabled after {reason}", rule.id),
            );
            continue;
        }

        stats.attempted += 1;
        match classify_with_retry(classifier, &rule.evidence, policy).await {
            Ok(fields) if fields.confidence < policy.min_confidence => {
                stats.ignored += 1;
                debug!(
                    rule = %rule.id,
                    confidence = fields.confidence,
                    "classifier answer below minimum confidence"
                );
            }
            Ok(fields) => {
                if apply_fields(rule, &fields, &config.extraction.default_currency) {
                    stats.improved += 1;
                }
            }
            Err(e) => {
                stats.unavailable += 1;
                if matches!(e, ClassifyError::Permanent(_)) {
                    warn!(classifier = classifier.name(), error = %e, "classifier disabled");
                    disabled = Some(e.to_string());
                }
                warnings.push(
                    WarningKind::ClassificationUnavailable,
                    Some(rule.page),
                    format!("{}: {e}", rule.id),
                );
            }
        }
    }

    info!(
        classifier = classifier.name(),
        attempted = stats.attempted,
        improved = stats.improved,
        ignored = stats.ignored,
        unavailable = stats.unavailable,
        "classifier refinement complete"
    );
    stats
}

/// Fill unresolved fields from a classifier answer and rescore. Fields the
/// patterns resolved are never overwritten. Returns whether anything changed.
pub fn apply_fields(rule: &mut ExtractedRule, fields: &ClassifierFields, default_currency: &str) -> bool {
    let mut changed = false;

    if rule.service_name.is_none()
        && let Some(name) = fields.service_name.as_deref().map(str::trim)
        && !name.is_empty()
    {
        rule.service_name = Some(name.to_string());
        changed = true;
    }

    if rule.facility_level.is_none()
        && let Some(level) = fields.facility_level
        && FACILITY_LEVELS.contains(&level)
    {
        rule.facility_level = Some(level);
        changed = true;
    }

    if rule.amount().is_none()
        && let Some(amount) = fields.amount
    {
        match rule.tariff.as_mut() {
            Some(tariff) => tariff.amount = Some(amount),
            None => rule.tariff = Some(Tariff::known(default_currency, amount)),
        }
        changed = true;
    }

    if changed {
        let before = rule.confidence;
        rule.rescore();
        debug!(rule = %rule.id, from = before.as_str(), to = rule.confidence.as_str(), "rule refined");
    }
    changed
}
