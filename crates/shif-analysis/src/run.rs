//! The analysis stages in order: extract, refine, gate, detect, gaps.

use shif_ai::Classify;
use shif_core::{AnalyzerConfig, Contradiction, ExtractedRule, Gap, SourceDocument, WarningLog};

use crate::detect::detect_contradictions;
use crate::extract::extract_document;
use crate::gaps::analyze_gaps;
use crate::provenance::enforce_provenance;
use crate::refine::{RefineStats, refine_rules};

/// Everything one run produces, ready for the report writer.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub rules: Vec<ExtractedRule>,
    pub contradictions: Vec<Contradiction>,
    pub gaps: Vec<Gap>,
    pub warnings: WarningLog,
    /// `None` when no classifier was configured.
    pub refine: Option<RefineStats>,
}

/// Run every stage over a loaded document.
pub async fn analyze(
    doc: &SourceDocument,
    config: &AnalyzerConfig,
    classifier: Option<&dyn Classify>,
) -> Analysis {
    let (mut rules, mut warnings) = extract_document(doc, config);

    let refine = match classifier {
        Some(classifier) => Some(refine_rules(&mut rules, classifier, config, &mut warnings).await),
        None => None,
    };

    let rules = enforce_provenance(rules, doc, &mut warnings);
    let contradictions = detect_contradictions(&rules, config);
    let gaps = analyze_gaps(&rules, doc, config);

    Analysis {
        rules,
        contradictions,
        gaps,
        warnings,
        refine,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shif_ai::{ClassifierFields, ScriptedClassifier};
    use shif_core::{ContradictionKind, DiseaseEntry, GapSubtype, WarningKind};

    fn document() -> SourceDocument {
        SourceDocument::from_pages(
            "benefits.txt",
            [
                "Renal care\nHemodialysis KES 10,650 per session, Level 4\nHemodialysis KES 2,375 per session, Level 5",
                "Level 2: KES 500\nHypertension is common.\nCochlear implant KES TBD",
            ],
        )
    }

    fn config() -> AnalyzerConfig {
        let mut config = AnalyzerConfig::empty();
        config.diseases = vec![DiseaseEntry {
            name: "Hypertension".into(),
            treatments: vec!["antihypertensive".into()],
        }];
        config
    }

    #[tokio::test]
    async fn pattern_only_run() {
        let analysis = analyze(&document(), &config(), None).await;

        assert_eq!(analysis.rules.len(), 4);
        assert!(analysis.refine.is_none());
        assert_eq!(analysis.contradictions.len(), 1);
        assert_eq!(analysis.contradictions[0].kind, ContradictionKind::Tariff);
        assert_eq!(analysis.gaps.len(), 1);
        assert_eq!(analysis.gaps[0].subtype, GapSubtype::DiseaseTreatmentMismatch);
        assert_eq!(analysis.warnings.counts()[&WarningKind::Extraction], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn classifier_fills_and_closes_gap() {
        let fake = ScriptedClassifier::new(vec![
            Ok(ClassifierFields {
                service_name: Some("Antihypertensive review".into()),
                confidence: 0.9,
                ..Default::default()
            }),
            Ok(ClassifierFields {
                amount: Some(120_000),
                confidence: 0.9,
                ..Default::default()
            }),
        ]);

        let analysis = analyze(&document(), &config(), Some(&fake)).await;

        let stats = analysis.refine.unwrap();
        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.improved, 2);
        assert_eq!(analysis.rules[2].service_name.as_deref(), Some("Antihypertensive review"));
        assert_eq!(analysis.rules[3].amount(), Some(120_000));
        assert!(analysis.gaps.is_empty());
    }

    #[tokio::test]
    async fn exclusion_heading_does_not_contradict_the_service_above() {
        let doc = SourceDocument::from_pages(
            "benefits.txt",
            ["Renal care\nHemodialysis is covered at Level 4\nExclusions\nCosmetic surgery"],
        );
        let analysis = analyze(&doc, &AnalyzerConfig::empty(), None).await;

        assert_eq!(analysis.rules.len(), 2);
        assert_eq!(analysis.rules[1].service_name.as_deref(), Some("Cosmetic surgery"));
        assert!(analysis.contradictions.is_empty());
        assert!(analysis.warnings.is_empty());
    }

    #[tokio::test]
    async fn runs_are_repeatable() {
        let a = analyze(&document(), &config(), None).await;
        let b = analyze(&document(), &config(), None).await;
        assert_eq!(a.rules, b.rules);
        assert_eq!(a.contradictions, b.contradictions);
        assert_eq!(a.gaps, b.gaps);
    }
}
