//! Loaded source document: ordered pages of plain text.

use serde::{Deserialize, Serialize};

/// Text of a single page. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

impl PageText {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// A document as handed to the extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Display name, usually the input file name.
    pub name: String,
    pub pages: Vec<PageText>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, pages: Vec<PageText>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// Build a document from raw page strings, numbering them from 1.
    pub fn from_pages<I, S>(name: impl Into<String>, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText::new(i as u32 + 1, text))
            .collect();
        Self::new(name, pages)
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Look up a page by its 1-based number.
    pub fn page(&self, number: u32) -> Option<&PageText> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Total characters across all pages.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}
