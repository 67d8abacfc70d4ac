//! Page segmentation into text lines and table rows.

use once_cell::sync::Lazy;
use regex::Regex;

/// Column gap in text extracted from a table: a tab or two or more spaces.
static COLUMN_GAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\t+|[ ]{2,}").expect("column gap pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Table,
}

/// One non-blank line of a page.
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    /// Zero-based line index on the page.
    pub index: usize,
    /// The line as it appears on the page, without the line terminator.
    pub line: &'a str,
    pub kind: SegmentKind,
    /// Flattened cells for table rows; empty for text.
    pub cells: Vec<&'a str>,
}

/// Split a page into segments, skipping blank lines.
pub fn segments(page: &str) -> Vec<Segment<'_>> {
    page.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| match table_cells(line) {
            Some(cells) => Segment {
                index,
                line,
                kind: SegmentKind::Table,
                cells,
            },
            None => Segment {
                index,
                line,
                kind: SegmentKind::Text,
                cells: Vec::new(),
            },
        })
        .collect()
}

/// Cells of a table row, or `None` when the line reads as prose.
///
/// A row has at least three cells separated by column gaps, or at least two
/// cells separated by `|`.
pub fn table_cells(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();

    let gapped: Vec<&str> = COLUMN_GAP
        .split(trimmed)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if gapped.len() >= 3 {
        return Some(gapped);
    }

    if trimmed.contains('|') {
        let piped: Vec<&str> = trimmed
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if piped.len() >= 2 {
            return Some(piped);
        }
    }

    None
}
