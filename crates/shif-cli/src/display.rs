//! Run summary card for the terminal.
//!
//! Renders a [`RunSummary`] as grouped sections, followed by the first few
//! warnings of the run.

use std::path::PathBuf;

use shif_analysis::RefineStats;
use shif_core::{RunSummary, WarningLog};

const MAX_LIST_ITEMS: usize = 10;

/// Print the summary of one analyze run as a vertical card.
pub fn print_summary(summary: &RunSummary, refine: Option<&RefineStats>, written: &[PathBuf]) {
    println!("=== {} ===", summary.document);
    println!("{}", summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();

    println!("Document");
    field("pages", summary.pages);
    println!();

    println!("Rules");
    field("total", summary.rules);
    for (confidence, n) in &summary.rules_by_confidence {
        field(&format!("confidence {}", confidence.as_str()), n);
    }
    field("from tables", summary.rules_from_tables);
    field("unknown amount", summary.rules_with_unknown_amount);
    field("exclusions", summary.exclusions);
    println!();

    if let Some(stats) = refine {
        println!("Classifier");
        field("attempted", stats.attempted);
        field("improved", stats.improved);
        field("ignored (low confidence)", stats.ignored);
        field("unavailable", stats.unavailable);
        println!();
    }

    println!("Contradictions");
    field("total", summary.contradictions);
    for (kind, n) in &summary.contradictions_by_kind {
        field(kind.as_str(), n);
    }
    println!();

    println!("Gaps");
    field("total", summary.gaps);
    for (subtype, n) in &summary.gaps_by_subtype {
        field(subtype.as_str(), n);
    }
    println!();

    if !summary.warnings_by_kind.is_empty() {
        println!("Warnings");
        for (kind, n) in &summary.warnings_by_kind {
            field(kind.as_str(), n);
        }
        println!();
    }

    if !written.is_empty() {
        println!("Output");
        for path in written {
            println!("  {}", path.display());
        }
    }
}

/// Print up to [`MAX_LIST_ITEMS`] warnings, then a count of the rest.
pub fn print_warnings(warnings: &WarningLog) {
    if warnings.is_empty() {
        return;
    }
    eprintln!();
    for w in warnings.entries().iter().take(MAX_LIST_ITEMS) {
        eprintln!("  {w}");
    }
    if warnings.len() > MAX_LIST_ITEMS {
        eprintln!("  ... and {} more", warnings.len() - MAX_LIST_ITEMS);
    }
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<26} {}", label, value);
}
