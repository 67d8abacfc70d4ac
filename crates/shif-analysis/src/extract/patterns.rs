//! Compiled patterns for tariff lines.

use once_cell::sync::Lazy;
use regex::{Match, Regex};
use shif_core::{Coverage, PaymentMechanism};

/// Currency marker and the token that follows it.
///
/// Group 1 is the marker. Group 2 holds a token starting with a digit
/// (`KES 10,650`, `KSh10650`); group 3 holds any other word after
/// whitespace (`KES TBD`), which parses as an unknown amount.
pub static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(KES|KSH|KSHS)(?:\.?\s*(\d\S*)|\.?\s+([^\s\d]\S*))")
        .expect("amount pattern")
});

/// `Level 4`, `Level IV`, `Levels 4-6` (first tier wins).
pub static LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\blevels?\s*[-:]?\s*(vi|iv|v|iii|ii|i|[1-6])\b").expect("level pattern")
});

/// Billing unit directly after an amount: `per session`, `/visit`.
pub static UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\s,]*(?:per|/)\s*([a-z]+)").expect("unit pattern")
});

/// Frequency cap: `maximum of 3 sessions per week`, `up to 2 visits a year`.
pub static LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:maximum|max\.?|up to|limited to|not more than|not exceeding)\s+(?:of\s+)?(\d+)\s+([a-z]+)\s+(?:per|a|an|every|each|in a)\s+([a-z]+)\b",
    )
    .expect("limit pattern")
});

static EXCLUSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:excluded|exclusions?|not covered|not payable|not eligible|does not cover)\b",
    )
    .expect("exclusion pattern")
});

static INCLUSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:covered|included|inclusive of|payable|eligible)\b")
        .expect("inclusion pattern")
});

static PAYMENT: Lazy<Vec<(Regex, PaymentMechanism)>> = Lazy::new(|| {
    [
        (r"(?i)\b(?:fee[- ]for[- ]service|FFS)\b", PaymentMechanism::FeeForService),
        (r"(?i)\bcapitation\b", PaymentMechanism::Capitation),
        (r"(?i)\bcase[- ]based\b", PaymentMechanism::CaseBased),
        (r"(?i)\bglobal budget\b", PaymentMechanism::GlobalBudget),
    ]
    .into_iter()
    .map(|(p, m)| (Regex::new(p).expect("payment pattern"), m))
    .collect()
});

/// Leading list numbering: `3.`, `1.2)`, `(a)`, `b)`, bullets.
pub static NUMBERING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\(?\d+[.)]|\d+(?:\.\d+)+\.?|\(?[a-z][.)]|[-•*–])\s+")
        .expect("numbering pattern")
});

/// First coverage keyword in `text`. Exclusions win over inclusions.
pub fn coverage_keyword(text: &str) -> Option<(Coverage, Match<'_>)> {
    if let Some(m) = EXCLUSION.find(text) {
        return Some((Coverage::Excluded, m));
    }
    INCLUSION.find(text).map(|m| (Coverage::Included, m))
}

/// Remove every coverage keyword from `text`.
pub fn strip_coverage_keywords(text: &str) -> String {
    let text = EXCLUSION.replace_all(text, " ");
    INCLUSION.replace_all(&text, " ").into_owned()
}

pub fn payment_mechanism(text: &str) -> PaymentMechanism {
    PAYMENT
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, m)| *m)
        .unwrap_or(PaymentMechanism::Unspecified)
}

/// Remove every payment keyword from `text`.
pub fn strip_payment_keywords(text: &str) -> String {
    PAYMENT
        .iter()
        .fold(text.to_string(), |acc, (re, _)| re.replace_all(&acc, " ").into_owned())
}

/// Facility tier from a [`LEVEL`] capture: `4` or `IV`.
pub fn parse_level(token: &str) -> Option<u8> {
    match token.to_ascii_lowercase().as_str() {
        "1" | "i" => Some(1),
        "2" | "ii" => Some(2),
        "3" | "iii" => Some(3),
        "4" | "iv" => Some(4),
        "5" | "v" => Some(5),
        "6" | "vi" => Some(6),
        _ => None,
    }
}

/// Singular form of a unit word: `sessions` → `session`.
pub fn singular(word: &str) -> String {
    let lower = word.to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if stem.len() > 2 && !stem.ends_with('s') => stem.to_string(),
        _ => lower,
    }
}
