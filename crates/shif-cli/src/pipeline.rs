//! Analyze pipeline: load the document, run the analysis stages, write reports.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use shif_ai::Classify;
use shif_analysis::{RefineStats, analyze};
use shif_core::{AnalyzerConfig, RunSummary, WarningLog};
use shif_store::{ReportFormat, ReportWriter};

pub struct AnalyzeStats {
    pub summary: RunSummary,
    pub written: Vec<PathBuf>,
    pub refine: Option<RefineStats>,
    pub warnings: WarningLog,
    pub elapsed_secs: f64,
}

/// Run the full pipeline: load → extract → refine → detect → gaps → write.
pub async fn run_analyze_pipeline(
    input: &Path,
    out_dir: &Path,
    config: &AnalyzerConfig,
    format: ReportFormat,
    classifier: Option<&dyn Classify>,
) -> anyhow::Result<AnalyzeStats> {
    let start = Instant::now();

    // 1. Load document.
    let (doc, load_warnings) = shif_store::load_document(input)
        .with_context(|| format!("loading {}", input.display()))?;
    eprintln!(
        "  Loaded {} pages ({} chars) from {}",
        doc.page_count(),
        doc.char_count(),
        input.display()
    );

    // 2. Analysis stages.
    if let Some(c) = classifier {
        eprintln!("  Refining ambiguous rules with the {} classifier...", c.name());
    }
    let analysis = analyze(&doc, config, classifier).await;
    eprintln!(
        "  Extracted {} rules, {} contradictions, {} gaps",
        analysis.rules.len(),
        analysis.contradictions.len(),
        analysis.gaps.len()
    );

    let mut warnings = load_warnings;
    warnings.extend(analysis.warnings);

    // 3. Write reports.
    let writer = ReportWriter::create(out_dir, format)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let mut written = writer
        .write_tables(&analysis.rules, &analysis.contradictions, &analysis.gaps)
        .context("writing report tables")?;

    let summary = RunSummary::build(
        &doc.name,
        doc.page_count(),
        &analysis.rules,
        &analysis.contradictions,
        &analysis.gaps,
        &warnings,
    );
    written.push(writer.write_summary(&summary).context("writing summary")?);
    eprintln!("  Wrote {} files to {}", written.len(), out_dir.display());

    Ok(AnalyzeStats {
        summary,
        written,
        refine: analysis.refine,
        warnings,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shif_ai::{ClassifyError, ScriptedClassifier};

    const INPUT: &str = "Renal care\n\
        Hemodialysis KES 10,650 per session, Level 4\n\
        Hemodialysis KES 2,375 per session, Level 5\n\
        \u{c}Level 2: KES 500\n\
        Hypertension is common.\n";

    #[tokio::test]
    async fn writes_all_reports() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("benefits.txt");
        std::fs::write(&input, INPUT).unwrap();
        let out = dir.path().join("out");

        let stats = run_analyze_pipeline(
            &input,
            &out,
            &AnalyzerConfig::builtin().unwrap(),
            ReportFormat::Csv,
            None,
        )
        .await
        .unwrap();

        assert_eq!(stats.summary.pages, 2);
        assert_eq!(stats.summary.rules, 3);
        assert_eq!(stats.summary.contradictions, 1);
        assert_eq!(stats.written.len(), 4);
        assert!(stats.refine.is_none());

        let contradictions = std::fs::read_to_string(out.join("contradictions.csv")).unwrap();
        assert!(contradictions.contains("C0001,tariff,R0001,R0002"));
        let gaps = std::fs::read_to_string(out.join("gaps.csv")).unwrap();
        assert!(gaps.contains("disease_treatment_mismatch,Hypertension"));
        assert!(out.join("summary.json").exists());
    }

    #[tokio::test]
    async fn reruns_produce_identical_tables() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("benefits.txt");
        std::fs::write(&input, INPUT).unwrap();
        let config = AnalyzerConfig::builtin().unwrap();

        let mut outputs = Vec::new();
        for run in ["a", "b"] {
            let out = dir.path().join(run);
            run_analyze_pipeline(&input, &out, &config, ReportFormat::Csv, None)
                .await
                .unwrap();
            outputs.push(
                ["rules.csv", "contradictions.csv", "gaps.csv"]
                    .map(|f| std::fs::read(out.join(f)).unwrap()),
            );
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn classifier_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("benefits.txt");
        std::fs::write(&input, INPUT).unwrap();
        let fake = ScriptedClassifier::repeating(Err(ClassifyError::Transient("503".into())));

        let stats = run_analyze_pipeline(
            &input,
            &dir.path().join("out"),
            &AnalyzerConfig::builtin().unwrap(),
            ReportFormat::Csv,
            Some(&fake),
        )
        .await
        .unwrap();

        assert_eq!(stats.summary.rules, 3);
        assert_eq!(stats.refine.map(|r| r.unavailable), Some(1));
        assert_eq!(stats.summary.warnings_by_kind.len(), 1);
    }

    #[tokio::test]
    async fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_analyze_pipeline(
            &dir.path().join("missing.pdf"),
            &dir.path().join("out"),
            &AnalyzerConfig::empty(),
            ReportFormat::Csv,
            None,
        )
        .await;
        assert!(result.is_err());
    }
}
