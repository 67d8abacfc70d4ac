//! Fuzzy comparison of normalized service names.

/// Token-sort ratio in `[0, 1]`: tokens of each name sorted and rejoined,
/// then compared by normalized Levenshtein similarity. Word order does not
/// matter: "dialysis renal" scores 1.0 against "renal dialysis".
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Whether one non-empty name contains the other.
pub fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_and_reordered_names_score_one() {
        assert_eq!(token_sort_ratio("hemodialysis", "hemodialysis"), 1.0);
        assert_eq!(token_sort_ratio("renal dialysis", "dialysis renal"), 1.0);
    }

    #[test]
    fn spelling_variants_score_high() {
        assert!(token_sort_ratio("haemodialysis", "hemodialysis") > 0.9);
        assert!(token_sort_ratio("ct scan", "mri scan") < 0.75);
    }

    #[test]
    fn empty_names_never_match() {
        assert_eq!(token_sort_ratio("", ""), 0.0);
        assert_eq!(token_sort_ratio("x ray", ""), 0.0);
        assert!(!contains_either("", "x ray"));
    }

    #[test]
    fn containment() {
        assert!(contains_either("ct scan", "ct scan contrast"));
        assert!(!contains_either("ct scan", "mri"));
    }
}
