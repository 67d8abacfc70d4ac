//! Rule extraction: turns page text into [`ExtractedRule`]s with provenance.
//!
//! Each page is split into segments (prose lines and table rows). A segment
//! yields one rule per currency amount it contains; a segment without amounts
//! yields at most one rule when it carries a coverage keyword or a frequency
//! cap, or when it is listed under a bare coverage heading. Every rule
//! records its page and a verbatim evidence snippet.

pub mod amount;
pub mod patterns;
pub mod segment;

use std::ops::Range;

use regex::{Captures, Match};
use shif_core::config::ExtractionSettings;
use shif_core::{
    AnalyzerConfig, Confidence, Coverage, ExtractedRule, Frequency, PageText, RuleSource,
    SourceDocument, Tariff, WarningKind, WarningLog,
};
use tracing::{debug, info};

use amount::{CURRENCY, figure_len, parse_amount};
use patterns::{
    AMOUNT, LEVEL, LIMIT, NUMBERING, UNIT, coverage_keyword, parse_level, payment_mechanism,
    singular, strip_coverage_keywords, strip_payment_keywords,
};
use segment::{Segment, SegmentKind, segments};

pub use amount::parse_tariff;

/// Trailing words dropped from a service name: `Hemodialysis at`, `Consultation fee`.
const CONNECTORS: &[&str] = &[
    "a", "and", "are", "at", "charged", "cost", "costs", "fee", "for", "is", "of", "or", "per",
    "rate", "tariff", "the", "to", "with",
];

/// Extracts rules from pages using the configured extraction settings.
pub struct Extractor<'a> {
    settings: &'a ExtractionSettings,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a AnalyzerConfig) -> Self {
        Self {
            settings: &config.extraction,
        }
    }

    /// Rules found on one page, in discovery order. Ids are left empty.
    ///
    /// A bare coverage heading (`Exclusions`, `Not covered:`) opens a list:
    /// the plain lines under it become rules with that coverage, until a
    /// blank line, an amount, another keyword line or a `Title:` line.
    pub fn extract_page(&self, page: &PageText, warnings: &mut WarningLog) -> Vec<ExtractedRule> {
        let segs = segments(&page.text);
        let mut rules = Vec::new();
        let mut section: Option<Section> = None;

        for pos in 0..segs.len() {
            let seg = &segs[pos];
            if section.is_some_and(|s| seg.index > s.last_index + 1) {
                section = None;
            }

            let mut found_amount = false;
            for caps in AMOUNT.captures_iter(seg.line) {
                let Some(whole) = caps.get(0) else { continue };
                found_amount = true;
                rules.push(self.tariff_rule(page.number, &segs, pos, whole, &caps, warnings));
            }
            if found_amount {
                section = None;
                continue;
            }

            match self.keyword_line(page.number, &segs, pos) {
                Some(KeywordLine::Rule(rule)) => {
                    rules.push(rule);
                    section = None;
                }
                Some(KeywordLine::Heading(coverage)) => {
                    debug!(page = page.number, line = seg.line.trim(), "coverage heading");
                    section = Some(Section {
                        coverage,
                        last_index: seg.index,
                    });
                }
                Some(KeywordLine::Skip) => section = None,
                None => {
                    let item = section.and_then(|s| self.section_item(page.number, seg, s.coverage));
                    match item {
                        Some(rule) => {
                            if let Some(open) = section.as_mut() {
                                open.last_index = seg.index;
                            }
                            rules.push(rule);
                        }
                        None => section = None,
                    }
                }
            }
        }

        debug!(page = page.number, rules = rules.len(), "extracted page");
        rules
    }

    fn tariff_rule(
        &self,
        page: u32,
        segs: &[Segment<'_>],
        pos: usize,
        whole: Match<'_>,
        caps: &Captures<'_>,
        warnings: &mut WarningLog,
    ) -> ExtractedRule {
        let seg = &segs[pos];
        let line = seg.line;
        let span = whole.range();
        let clause = clause_bounds(line, seg.kind, span.start);

        let figure = caps.get(2);
        let amount = figure.and_then(|m| parse_amount(m.as_str()));
        if amount.is_none() {
            warnings.push(
                WarningKind::Extraction,
                Some(page),
                format!("unparseable amount {:?} in {:?}", whole.as_str(), line.trim()),
            );
        }

        let unit_from = figure.map_or(span.end, |m| m.start() + figure_len(m.as_str()));
        let unit = UNIT
            .captures(&line[unit_from..])
            .map(|c| singular(&c[1]));
        let frequency = frequency_limit(&line[clause.clone()])
            .or_else(|| unit.map(Frequency::per_unit));

        let level = nearest_level(line, &clause, &span);
        let clause_text = &line[clause.clone()];
        let coverage = coverage_keyword(clause_text).map_or(Coverage::Unspecified, |(c, _)| c);

        let service_name = match seg.kind {
            SegmentKind::Table => first_text_cell(&seg.cells),
            SegmentKind::Text => name_before(&line[clause.start..span.start]),
        }
        .or_else(|| self.heading_before(segs, pos));

        let evidence = self.evidence(seg, &span, level.as_ref().map(|(_, r)| r));

        let mut rule = ExtractedRule {
            id: String::new(),
            service_name,
            facility_level: level.map(|(l, _)| l),
            tariff: Some(Tariff {
                currency: CURRENCY.to_string(),
                amount,
            }),
            frequency,
            coverage,
            payment: payment_mechanism(clause_text),
            page,
            evidence,
            confidence: Confidence::Low,
            source: source_of(seg.kind),
        };
        rule.rescore();
        rule
    }

    /// A coverage or frequency-cap statement without an amount. `None` when
    /// the line carries neither.
    fn keyword_line(&self, page: u32, segs: &[Segment<'_>], pos: usize) -> Option<KeywordLine> {
        let seg = &segs[pos];
        let line = seg.line;

        let (coverage, span) = match coverage_keyword(line) {
            Some((coverage, m)) => (coverage, m.range()),
            None => (Coverage::Unspecified, LIMIT.find(line)?.range()),
        };
        let clause = clause_bounds(line, seg.kind, span.start);
        let clause_text = &line[clause.clone()];

        let own_name = match seg.kind {
            SegmentKind::Table => first_text_cell(&seg.cells),
            SegmentKind::Text => name_before(&line[clause.start..span.start])
                .or_else(|| clean_name(&line[span.end..clause.end])),
        };
        let service_name = match own_name {
            Some(name) => name,
            None if coverage != Coverage::Unspecified => {
                let heading = seg.kind == SegmentKind::Text
                    && line.trim().chars().count() <= self.settings.heading_max_chars;
                if heading {
                    return Some(KeywordLine::Heading(coverage));
                }
                debug!(page, line = line.trim(), "coverage keyword without a service, skipped");
                return Some(KeywordLine::Skip);
            }
            None => match self.heading_before(segs, pos) {
                Some(name) => name,
                None => {
                    debug!(page, line = line.trim(), "frequency cap without a service, skipped");
                    return Some(KeywordLine::Skip);
                }
            },
        };

        let level = nearest_level(line, &clause, &span);
        let evidence = self.evidence(seg, &span, level.as_ref().map(|(_, r)| r));

        let mut rule = ExtractedRule {
            id: String::new(),
            service_name: Some(service_name),
            facility_level: level.map(|(l, _)| l),
            tariff: None,
            frequency: frequency_limit(clause_text),
            coverage,
            payment: payment_mechanism(clause_text),
            page,
            evidence,
            confidence: Confidence::Low,
            source: source_of(seg.kind),
        };
        rule.rescore();
        Some(KeywordLine::Rule(rule))
    }

    /// A plain line listed under a coverage heading. The whole line is the
    /// evidence.
    fn section_item(&self, page: u32, seg: &Segment<'_>, coverage: Coverage) -> Option<ExtractedRule> {
        let line = seg.line;
        if seg.kind == SegmentKind::Text && line.trim_end().ends_with(':') {
            return None;
        }
        let service_name = match seg.kind {
            SegmentKind::Table => first_text_cell(&seg.cells),
            SegmentKind::Text => clean_name(line),
        }?;

        let mut rule = ExtractedRule {
            id: String::new(),
            service_name: Some(service_name),
            facility_level: nearest_level(line, &(0..line.len()), &(0..0)).map(|(l, _)| l),
            tariff: None,
            frequency: None,
            coverage,
            payment: payment_mechanism(line),
            page,
            evidence: line.trim().to_string(),
            confidence: Confidence::Low,
            source: source_of(seg.kind),
        };
        rule.rescore();
        Some(rule)
    }

    /// Nearest preceding line on the page that reads as a heading: short,
    /// no amount, not a table row, not a coverage or cap statement, and
    /// naming something.
    fn heading_before(&self, segs: &[Segment<'_>], pos: usize) -> Option<String> {
        segs[..pos]
            .iter()
            .rev()
            .filter(|s| s.kind == SegmentKind::Text)
            .filter(|s| !AMOUNT.is_match(s.line))
            .filter(|s| coverage_keyword(s.line).is_none() && !LIMIT.is_match(s.line))
            .filter(|s| s.line.trim().chars().count() <= self.settings.heading_max_chars)
            .find_map(|s| clean_name(s.line))
    }

    /// Table rows keep the whole row; prose keeps the match plus context,
    /// widened to cover the facility marker.
    fn evidence(&self, seg: &Segment<'_>, span: &Range<usize>, marker: Option<&Range<usize>>) -> String {
        match seg.kind {
            SegmentKind::Table => seg.line.trim().to_string(),
            SegmentKind::Text => {
                let start = marker.map_or(span.start, |m| m.start.min(span.start));
                let end = marker.map_or(span.end, |m| m.end.max(span.end));
                context_window(seg.line, start, end, self.settings.context_window).to_string()
            }
        }
    }
}

/// What an amount-free line with a coverage or cap keyword turns into.
enum KeywordLine {
    Rule(ExtractedRule),
    /// Bare coverage heading opening a list.
    Heading(Coverage),
    Skip,
}

/// Open coverage list and the line index of its last member.
#[derive(Debug, Clone, Copy)]
struct Section {
    coverage: Coverage,
    last_index: usize,
}

/// Extract every page of `doc` and assign ids (`R0001`, ...) in page then
/// discovery order.
pub fn extract_document(
    doc: &SourceDocument,
    config: &AnalyzerConfig,
) -> (Vec<ExtractedRule>, WarningLog) {
    let extractor = Extractor::new(config);
    let mut warnings = WarningLog::new();

    let mut pages: Vec<&PageText> = doc.pages.iter().collect();
    pages.sort_by_key(|p| p.number);

    let mut rules: Vec<ExtractedRule> = pages
        .into_iter()
        .flat_map(|page| extractor.extract_page(page, &mut warnings))
        .collect();
    for (i, rule) in rules.iter_mut().enumerate() {
        rule.id = format!("R{:04}", i + 1);
    }

    info!(
        document = %doc.name,
        pages = doc.page_count(),
        rules = rules.len(),
        warnings = warnings.len(),
        "extraction complete"
    );
    (rules, warnings)
}

fn source_of(kind: SegmentKind) -> RuleSource {
    match kind {
        SegmentKind::Text => RuleSource::Text,
        SegmentKind::Table => RuleSource::Table,
    }
}

/// Byte range of the clause containing `at`. Prose clauses end at `;`; a
/// table row is one clause.
fn clause_bounds(line: &str, kind: SegmentKind, at: usize) -> Range<usize> {
    match kind {
        SegmentKind::Table => 0..line.len(),
        SegmentKind::Text => {
            let start = line[..at].rfind(';').map_or(0, |i| i + 1);
            let end = line[at..].find(';').map_or(line.len(), |i| at + i);
            start..end
        }
    }
}

/// Facility marker inside `clause` closest to `span`; earlier marker on a tie.
fn nearest_level(line: &str, clause: &Range<usize>, span: &Range<usize>) -> Option<(u8, Range<usize>)> {
    LEVEL
        .captures_iter(line)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            if m.start() < clause.start || m.end() > clause.end {
                return None;
            }
            let level = parse_level(&caps[1])?;
            let distance = if m.end() <= span.start {
                span.start - m.end()
            } else {
                m.start().saturating_sub(span.end)
            };
            Some((distance, level, m.range()))
        })
        .min_by_key(|(distance, _, range)| (*distance, range.start))
        .map(|(_, level, range)| (level, range))
}

fn frequency_limit(clause: &str) -> Option<Frequency> {
    let caps = LIMIT.captures(clause)?;
    let count = caps[1].parse().ok()?;
    Some(Frequency::limit(
        count,
        singular(&caps[2]),
        Some(singular(&caps[3])),
    ))
}

/// `line[start..end]` widened by `window` bytes each side, clamped to char
/// boundaries and trimmed.
fn context_window(line: &str, start: usize, end: usize, window: usize) -> &str {
    let mut from = start.saturating_sub(window);
    while !line.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = end.saturating_add(window).min(line.len());
    while !line.is_char_boundary(to) {
        to += 1;
    }
    line[from..to].trim()
}

/// Service name from the text before an amount or keyword. A label after
/// the last colon (`Renal: Hemodialysis`) wins over the whole prefix.
fn name_before(prefix: &str) -> Option<String> {
    if let Some((_, tail)) = prefix.rsplit_once(':')
        && let Some(name) = clean_name(tail)
    {
        return Some(name);
    }
    clean_name(prefix)
}

fn first_text_cell(cells: &[&str]) -> Option<String> {
    cells.iter().find_map(|c| clean_name(c))
}

/// Strip amounts, facility markers, billing keywords, list numbering and
/// trailing connectors. `None` unless something nameable remains.
fn clean_name(raw: &str) -> Option<String> {
    let text = AMOUNT.replace_all(raw, " ");
    let text = LEVEL.replace_all(&text, " ");
    let text = strip_payment_keywords(&text);
    let text = strip_coverage_keywords(&text);
    let text = NUMBERING.replace(&text, "");

    let mut name = text.split_whitespace().collect::<Vec<_>>().join(" ");
    loop {
        let trimmed = name
            .trim_matches(|c: char| c.is_whitespace() || ":;,.-–|/*•".contains(c))
            .to_string();
        let trimmed = match trimmed.rsplit_once(' ') {
            Some((head, last)) if CONNECTORS.contains(&last.to_lowercase().as_str()) => {
                head.to_string()
            }
            _ => trimmed,
        };
        if trimmed == name {
            break;
        }
        name = trimmed;
    }

    (name.chars().filter(|c| c.is_alphabetic()).count() >= 2).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shif_core::PaymentMechanism;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::empty()
    }

    fn extract(pages: &[&str]) -> (Vec<ExtractedRule>, WarningLog) {
        let doc = SourceDocument::from_pages("test.txt", pages.iter().copied());
        extract_document(&doc, &config())
    }

    #[test]
    fn hemodialysis_lines() {
        let (rules, warnings) = extract(&[
            "Renal care\nHemodialysis KES 10,650 per session, Level 4\nHemodialysis KES 2,375 per session, Level 5",
        ]);
        assert!(warnings.is_empty());
        assert_eq!(rules.len(), 2);

        let first = &rules[0];
        assert_eq!(first.id, "R0001");
        assert_eq!(first.service_name.as_deref(), Some("Hemodialysis"));
        assert_eq!(first.amount(), Some(10_650));
        assert_eq!(first.currency(), Some("KES"));
        assert_eq!(first.frequency, Some(Frequency::per_unit("session")));
        assert_eq!(first.facility_level, Some(4));
        assert_eq!(first.confidence, Confidence::High);
        assert_eq!(first.evidence, "Hemodialysis KES 10,650 per session, Level 4");

        assert_eq!(rules[1].id, "R0002");
        assert_eq!(rules[1].amount(), Some(2_375));
        assert_eq!(rules[1].facility_level, Some(5));
    }

    #[test]
    fn unparseable_amount_emits_low_rule_and_warning() {
        let (rules, warnings) = extract(&["Cochlear implant KES TBD"]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].amount(), None);
        assert_eq!(rules[0].tariff, Some(Tariff::unknown("KES")));
        assert_eq!(rules[0].confidence, Confidence::Low);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings.entries()[0].kind, WarningKind::Extraction);
        assert_eq!(warnings.entries()[0].page, Some(1));
    }

    #[test]
    fn malformed_groups_are_unknown() {
        let (rules, warnings) = extract(&["MRI scan KES 1,0 Level 5"]);
        assert_eq!(rules[0].amount(), None);
        assert_eq!(rules[0].confidence, Confidence::Medium);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn several_amounts_take_nearest_level() {
        let (rules, _) = extract(&["CT scan: Level 4 KES 8,000; Level 5 KES 9,500"]);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].facility_level, Some(4));
        assert_eq!(rules[1].facility_level, Some(5));
        assert_eq!(rules[0].service_name.as_deref(), Some("CT scan"));
        assert_eq!(rules[1].service_name, None);
        assert_eq!(rules[1].amount(), Some(9_500));
    }

    #[test]
    fn table_row_uses_first_cell_and_whole_row() {
        let page = "Service    Tariff    Facility\n  Hemodialysis    KES 10,650    Level IV  ";
        let (rules, _) = extract(&[page]);
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.source, RuleSource::Table);
        assert_eq!(rule.service_name.as_deref(), Some("Hemodialysis"));
        assert_eq!(rule.facility_level, Some(4));
        assert_eq!(rule.evidence, "Hemodialysis    KES 10,650    Level IV");
    }

    #[test]
    fn heading_supplies_missing_name() {
        let (rules, _) = extract(&["Physiotherapy\nLevel 3: KES 1,500 per session"]);
        assert_eq!(rules[0].service_name.as_deref(), Some("Physiotherapy"));
        assert_eq!(rules[0].confidence, Confidence::High);
    }

    #[test]
    fn exclusion_statements() {
        let (rules, _) = extract(&["Exclusions: cosmetic surgery\nDental implants are not covered"]);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].service_name.as_deref(), Some("cosmetic surgery"));
        assert_eq!(rules[0].coverage, Coverage::Excluded);
        assert_eq!(rules[1].service_name.as_deref(), Some("Dental implants"));
        assert_eq!(rules[1].coverage, Coverage::Excluded);
        assert!(rules[1].tariff.is_none());
        assert_eq!(rules[1].confidence, Confidence::Low);
    }

    #[test]
    fn coverage_heading_lists_excluded_items() {
        let (rules, _) = extract(&[
            "Renal care\nHemodialysis is covered at Level 4\nExclusions\nCosmetic surgery\nDental implants\n\nWellness retreats",
        ]);
        let found: Vec<_> = rules
            .iter()
            .map(|r| (r.service_name.as_deref(), r.coverage, r.evidence.as_str()))
            .collect();
        assert_eq!(
            found,
            [
                (Some("Hemodialysis"), Coverage::Included, "Hemodialysis is covered at Level 4"),
                (Some("Cosmetic surgery"), Coverage::Excluded, "Cosmetic surgery"),
                (Some("Dental implants"), Coverage::Excluded, "Dental implants"),
            ]
        );
        assert_eq!(rules[0].facility_level, Some(4));
    }

    #[test]
    fn coverage_list_ends_at_amount_line() {
        let (rules, _) = extract(&["Not covered:\nCosmetic surgery\nCT scan KES 8,000 Level 5\nMRI"]);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].coverage, Coverage::Excluded);
        assert_eq!(rules[1].service_name.as_deref(), Some("CT scan"));
        assert_eq!(rules[1].coverage, Coverage::Unspecified);
    }

    #[test]
    fn statements_are_not_headings() {
        let (rules, _) = extract(&["Dental implants are not covered\nLevel 3: KES 1,500"]);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].service_name, None);
    }

    #[test]
    fn frequency_cap_statement() {
        let (rules, _) = extract(&["Physiotherapy: maximum of 3 sessions per week"]);
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].frequency,
            Some(Frequency::limit(3, "session", Some("week".into())))
        );
        assert_eq!(rules[0].service_name.as_deref(), Some("Physiotherapy"));
    }

    #[test]
    fn payment_mechanism_and_unit_slash() {
        let (rules, _) = extract(&["Outpatient consultation KES 500/visit, fee-for-service, Level 2"]);
        assert_eq!(rules[0].payment, PaymentMechanism::FeeForService);
        assert_eq!(rules[0].frequency, Some(Frequency::per_unit("visit")));
        assert_eq!(rules[0].service_name.as_deref(), Some("Outpatient consultation"));
    }

    #[test]
    fn evidence_is_on_its_page() {
        let long = format!(
            "{} Hemodialysis KES 10,650 per session, Level 4 {}",
            "x".repeat(200),
            "é".repeat(200)
        );
        let doc = SourceDocument::from_pages(
            "test.txt",
            [
                "Intro page without tariffs".to_string(),
                long,
                "Dental implants are not covered\n| CT scan | KES 8,000 |".to_string(),
            ],
        );
        let (rules, _) = extract_document(&doc, &config());
        assert!(!rules.is_empty());
        for rule in &rules {
            assert!(rule.page >= 1 && rule.page <= doc.page_count());
            assert!(!rule.evidence.is_empty());
            let page = doc.page(rule.page).unwrap();
            assert!(page.text.contains(&rule.evidence), "{} not on page", rule.id);
            assert!(rule.check_provenance(doc.page_count(), Some(&page.text)).is_ok());
        }
        assert!(rules[0].evidence.len() < 300);
    }

    #[test]
    fn extraction_is_idempotent() {
        let pages = [
            "Hemodialysis KES 10,650 per session, Level 4",
            "Exclusions: cosmetic surgery\nCT scan  KES 8,000  Level 5",
        ];
        let (a, _) = extract(&pages);
        let (b, _) = extract(&pages);
        assert_eq!(a, b);
    }

    #[test]
    fn ids_follow_page_order() {
        let doc = SourceDocument::new(
            "test.txt",
            vec![
                PageText::new(2, "MRI KES 12,000 Level 5"),
                PageText::new(1, "X-ray KES 1,200 Level 3"),
            ],
        );
        let (rules, _) = extract_document(&doc, &config());
        assert_eq!(rules[0].page, 1);
        assert_eq!(rules[0].id, "R0001");
        assert_eq!(rules[1].page, 2);
    }

    #[test]
    fn clean_name_strips_noise() {
        assert_eq!(clean_name("3. Hemodialysis at").as_deref(), Some("Hemodialysis"));
        assert_eq!(clean_name("Consultation fee - Level 2").as_deref(), Some("Consultation"));
        assert_eq!(clean_name("Level 4:"), None);
        assert_eq!(clean_name("  12  "), None);
    }

    #[test]
    fn context_window_respects_char_boundaries() {
        let line = "ééééé KES 100 ééééé";
        let start = line.find("KES").unwrap();
        let s = context_window(line, start, start + 7, 3);
        assert!(s.contains("KES 100"));
        assert!(line.contains(s));
    }
}
