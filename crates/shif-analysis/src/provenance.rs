//! Provenance gate between extraction and detection.

use shif_core::{ExtractedRule, SourceDocument, WarningKind, WarningLog};
use tracing::info;

/// Keep only rules whose page exists and whose evidence occurs verbatim on
/// it. Each rejected rule becomes a `ProvenanceRejected` warning.
pub fn enforce_provenance(
    rules: Vec<ExtractedRule>,
    doc: &SourceDocument,
    warnings: &mut WarningLog,
) -> Vec<ExtractedRule> {
    let page_count = doc.page_count();
    let before = rules.len();

    let kept: Vec<ExtractedRule> = rules
        .into_iter()
        .filter(|rule| {
            let page_text = doc.page(rule.page).map(|p| p.text.as_str());
            match rule.check_provenance(page_count, page_text) {
                Ok(()) => true,
                Err(e) => {
                    warnings.push(WarningKind::ProvenanceRejected, Some(rule.page), e.to_string());
                    false
                }
            }
        })
        .collect();

    info!(kept = kept.len(), rejected = before - kept.len(), "provenance check");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use shif_core::{Confidence, Coverage, PaymentMechanism, RuleSource};

    fn rule(id: &str, page: u32, evidence: &str) -> ExtractedRule {
        ExtractedRule {
            id: id.into(),
            service_name: Some("CT scan".into()),
            facility_level: None,
            tariff: None,
            frequency: None,
            coverage: Coverage::Excluded,
            payment: PaymentMechanism::Unspecified,
            page,
            evidence: evidence.into(),
            confidence: Confidence::Low,
            source: RuleSource::Text,
        }
    }

    #[test]
    fn rejects_rules_without_provenance() {
        let doc = SourceDocument::from_pages("t.txt", ["CT scan not covered", "page two"]);
        let rules = vec![
            rule("R0001", 1, "CT scan not covered"),
            rule("R0002", 3, "CT scan not covered"),
            rule("R0003", 2, ""),
            rule("R0004", 2, "CT scan not covered"),
        ];
        let mut warnings = WarningLog::new();

        let kept = enforce_provenance(rules, &doc, &mut warnings);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "R0001");
        assert_eq!(warnings.len(), 3);
        assert!(warnings
            .entries()
            .iter()
            .all(|w| w.kind == WarningKind::ProvenanceRejected));
    }
}
