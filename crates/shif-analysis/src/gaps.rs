//! Coverage gap analysis against the reference configuration.

use std::collections::{BTreeSet, HashSet};

use shif_core::{
    AnalyzerConfig, DiseaseEntry, ExpectedService, ExtractedRule, Gap, GapSubtype, SourceDocument,
    normalize_service_name,
};
use tracing::info;

use crate::similarity::{contains_either, token_sort_ratio};

/// Gaps for every disease, expected service and facility level.
///
/// Output order is diseases in configuration order, then expected services,
/// then facility levels ascending; ids are `G0001`, ... in that order.
pub fn analyze_gaps(rules: &[ExtractedRule], doc: &SourceDocument, config: &AnalyzerConfig) -> Vec<Gap> {
    let mut gaps = Vec::new();

    for disease in &config.diseases {
        gaps.extend(disease_gap(disease, rules, doc));
    }
    for service in &config.expected_services {
        gaps.extend(expected_service_gap(
            service,
            rules,
            config.detection.similarity_threshold,
        ));
    }
    for (&level, &minimum) in &config.facility_minimums {
        gaps.extend(facility_gap(level, minimum, rules));
    }

    for (i, gap) in gaps.iter_mut().enumerate() {
        gap.id = format!("G{:04}", i + 1);
    }
    info!(gaps = gaps.len(), "gap analysis complete");
    gaps
}

fn disease_gap(disease: &DiseaseEntry, rules: &[ExtractedRule], doc: &SourceDocument) -> Option<Gap> {
    let needle = disease.name.trim().to_lowercase();

    let mut mentions = 0;
    let mut pages = BTreeSet::new();
    for page in &doc.pages {
        for line in page.text.lines() {
            if contains_word(&line.to_lowercase(), &needle) {
                mentions += 1;
                pages.insert(page.number);
            }
        }
    }

    let keywords: Vec<String> = disease
        .treatments
        .iter()
        .map(|t| t.trim().to_lowercase())
        .collect();
    let matches = rules
        .iter()
        .filter(|r| {
            r.service_name.as_deref().is_some_and(|name| {
                let name = name.to_lowercase();
                keywords.iter().any(|k| contains_term(&name, k))
            })
        })
        .count();

    let subtype = match (mentions, matches) {
        (0, 0) => GapSubtype::NoCoverageFound,
        (_, 0) => GapSubtype::DiseaseTreatmentMismatch,
        _ => return None,
    };
    Some(Gap {
        id: String::new(),
        subtype,
        name: disease.name.clone(),
        mention_count: mentions,
        treatment_match_count: matches,
        evidence_pages: pages.into_iter().collect(),
    })
}

/// A gap unless some rule names the service (similar or containing name) at
/// the expected level. Mentions are the name matches at any level.
fn expected_service_gap(service: &ExpectedService, rules: &[ExtractedRule], threshold: f64) -> Option<Gap> {
    let wanted = normalize_service_name(&service.name);
    let named: Vec<&ExtractedRule> = rules
        .iter()
        .filter(|r| {
            r.service_name.as_deref().is_some_and(|name| {
                let have = normalize_service_name(name);
                token_sort_ratio(&wanted, &have) >= threshold || contains_either(&wanted, &have)
            })
        })
        .collect();

    let at_level = named
        .iter()
        .filter(|r| service.facility_level.is_none() || r.facility_level == service.facility_level)
        .count();
    if at_level > 0 {
        return None;
    }

    let name = match service.facility_level {
        Some(level) => format!("{} (level {level})", service.name),
        None => service.name.clone(),
    };
    let pages: BTreeSet<u32> = named.iter().map(|r| r.page).collect();
    Some(Gap {
        id: String::new(),
        subtype: GapSubtype::MissingExpectedService,
        name,
        mention_count: named.len(),
        treatment_match_count: 0,
        evidence_pages: pages.into_iter().collect(),
    })
}

fn facility_gap(level: u8, minimum: usize, rules: &[ExtractedRule]) -> Option<Gap> {
    let at_level: Vec<&ExtractedRule> = rules
        .iter()
        .filter(|r| r.facility_level == Some(level))
        .collect();
    let distinct: HashSet<String> = at_level
        .iter()
        .filter_map(|r| r.service_name.as_deref())
        .map(normalize_service_name)
        .filter(|n| !n.is_empty())
        .collect();
    if distinct.len() >= minimum {
        return None;
    }

    let pages: BTreeSet<u32> = at_level.iter().map(|r| r.page).collect();
    Some(Gap {
        id: String::new(),
        subtype: GapSubtype::FacilityLevelShortfall,
        name: format!("Level {level}"),
        mention_count: at_level.len(),
        treatment_match_count: distinct.len(),
        evidence_pages: pages.into_iter().collect(),
    })
}

/// Whole-word occurrence of `needle` in `haystack`; both already lowercased.
fn contains_word(haystack: &str, needle: &str) -> bool {
    word_match(haystack, needle, &[""])
}

/// Treatment keyword as whole words, allowing a plural ending:
/// `inhaler` matches `Inhalers`, `art` does not match `heart`.
fn contains_term(haystack: &str, needle: &str) -> bool {
    word_match(haystack, needle, &["", "s", "es"])
}

fn word_match(haystack: &str, needle: &str, endings: &[&str]) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let rest = &haystack[start + needle.len()..];
        !before.is_some_and(char::is_alphanumeric)
            && endings.iter().any(|end| {
                rest.strip_prefix(end)
                    .is_some_and(|tail| !tail.chars().next().is_some_and(char::is_alphanumeric))
            })
    })
}
