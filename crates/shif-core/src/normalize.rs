//! Service name normalisation for grouping tariff lines.
//!
//! Tariff schedules name the same service in many ways. A canonical form
//! strips the parts that vary between lines without changing what the
//! service is.
//!
//! # Conventions handled
//!
//! - Case: "HEMODIALYSIS", "Hemodialysis"
//! - Parenthesised qualifiers: "Hemodialysis (per session)"
//! - Facility markers: "Hemodialysis Level 4", "Hemodialysis - Level IV"
//! - Billing words: "Hemodialysis services", "Hemodialysis procedure"
//! - Punctuation and numbering: "3. Hemodialysis:", "Hemo-dialysis"

/// Words that qualify a service without identifying it.
const QUALIFIERS: &[&str] = &[
    "a", "an", "and", "at", "for", "in", "of", "on", "per", "the", "to", "with", "package",
    "procedure", "procedures", "service", "services", "session", "sessions", "tariff", "rate",
    "cost", "kes", "ksh", "kshs",
];

const ROMAN_LEVELS: &[&str] = &["i", "ii", "iii", "iv", "v", "vi"];

/// Normalise a service name into a canonical, space-separated token string.
///
/// Input: "3. Hemodialysis (per session) - Level IV"
/// Output: "hemodialysis"
///
/// # Algorithm
///
/// 1. Lowercase and drop parenthesised / bracketed spans
/// 2. Replace every non-alphanumeric character with a space
/// 3. Drop `level` plus the digit or roman numeral after it
/// 4. Drop pure numbers and [`QUALIFIERS`]
/// 5. Join the remaining tokens with single spaces
pub fn normalize_service_name(s: &str) -> String {
    let lower = strip_brackets(&s.to_lowercase());
    let cleaned: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens = Vec::new();
    let mut words = cleaned.split_whitespace().peekable();
    while let Some(word) = words.next() {
        if word == "level" || word == "levels" {
            // Skip the tier that follows.
            if words
                .peek()
                .is_some_and(|next| is_number(next) || ROMAN_LEVELS.contains(next))
            {
                words.next();
            }
            continue;
        }
        if is_number(word) || QUALIFIERS.contains(&word) {
            continue;
        }
        tokens.push(word);
    }

    tokens.join(" ")
}

fn is_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// Remove `(...)` and `[...]` spans, including unbalanced trailing openers.
fn strip_brackets(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
