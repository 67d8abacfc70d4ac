//! Currency amount parsing.

use shif_core::Tariff;

use super::patterns::AMOUNT;

/// Canonical code for every Kenyan shilling marker (`KES`, `KSh`, `Kshs.`).
pub const CURRENCY: &str = "KES";

/// Parse a figure with optional thousands separators and decimals.
///
/// Accepts `10650`, `10,650` and `10,650.00`; rejects malformed groups such
/// as `1,0` or `10,65,0`. Trailing punctuation (`10,650/-`, `500.`) is
/// ignored and the decimal part is dropped.
pub fn parse_amount(token: &str) -> Option<u64> {
    let figure = token.trim_end_matches(|c: char| !c.is_ascii_digit());
    let (whole, decimals) = match figure.split_once('.') {
        Some((w, d)) => (w, Some(d)),
        None => (figure, None),
    };
    if let Some(d) = decimals
        && (d.is_empty() || !d.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    if whole.is_empty() {
        return None;
    }

    if whole.contains(',') {
        let mut groups = whole.split(',');
        let head = groups.next()?;
        if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let mut digits = head.to_string();
        for group in groups {
            if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.push_str(group);
        }
        digits.parse().ok()
    } else if whole.chars().all(|c| c.is_ascii_digit()) {
        whole.parse().ok()
    } else {
        None
    }
}

/// Byte length of the numeric part of an amount token, so callers can look
/// at what follows the figure (`500/visit` → `/visit`).
pub fn figure_len(token: &str) -> usize {
    token.len() - token.trim_start_matches(|c: char| c.is_ascii_digit() || c == ',' || c == '.').len()
}

/// Parse the first currency amount in `text` into a [`Tariff`].
///
/// Returns `None` when no currency marker is present; an unparseable figure
/// yields a tariff with an unknown amount.
pub fn parse_tariff(text: &str) -> Option<Tariff> {
    let caps = AMOUNT.captures(text)?;
    let amount = caps.get(2).and_then(|m| parse_amount(m.as_str()));
    Some(Tariff {
        currency: CURRENCY.to_string(),
        amount,
    })
}
