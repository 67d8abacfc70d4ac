//! Document loading: PDF via lopdf, or pre-extracted text with form-feed page breaks.

use std::path::Path;

use lopdf::Document;
use shif_core::{PageText, SourceDocument, WarningKind, WarningLog};
use tracing::{debug, info};

use crate::StoreError;

/// Page separator used by `pdftotext` and friends.
pub const FORM_FEED: char = '\u{000C}';

/// Load a document from disk, choosing the reader by extension.
///
/// `.txt` / `.text` files are split into pages on form feeds; anything else is
/// parsed as PDF.
pub fn load_document(path: &Path) -> Result<(SourceDocument, WarningLog), StoreError> {
    if !path.exists() {
        return Err(StoreError::InputNotFound(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("text"));

    if is_text {
        let bytes = std::fs::read(path)?;
        let text = decode_text(&bytes)?;
        Ok((document_from_text(&name, text)?, WarningLog::new()))
    } else {
        let bytes = std::fs::read(path)?;
        document_from_pdf_bytes(&name, &bytes)
    }
}

/// UTF-8 text, or `MalformedInput` naming the page of the first bad byte.
fn decode_text(bytes: &[u8]) -> Result<&str, StoreError> {
    std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        let page = valid.iter().filter(|&&b| b == FORM_FEED as u8).count() as u32 + 1;
        StoreError::malformed_at(
            format!("text is not valid UTF-8 at byte {}", e.valid_up_to()),
            page,
        )
    })
}

/// Split pre-extracted text into pages on form feeds.
///
/// A trailing form feed does not start an extra page.
pub fn document_from_text(name: &str, text: &str) -> Result<SourceDocument, StoreError> {
    let mut pages: Vec<&str> = text.split(FORM_FEED).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(StoreError::malformed("document contains no text"));
    }
    let doc = SourceDocument::from_pages(name, pages);
    info!(name, pages = doc.page_count(), "loaded text document");
    Ok(doc)
}

/// Parse PDF bytes and extract the text of every page.
///
/// The whole document failing to parse is fatal. A single page whose text
/// cannot be extracted is kept as an empty page and reported as a warning,
/// so page numbering stays aligned with the PDF.
pub fn document_from_pdf_bytes(
    name: &str,
    bytes: &[u8],
) -> Result<(SourceDocument, WarningLog), StoreError> {
    let pdf = Document::load_mem(bytes).map_err(|e| StoreError::malformed(e.to_string()))?;
    if pdf.is_encrypted() {
        return Err(StoreError::malformed("encrypted PDFs are not supported"));
    }

    let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(StoreError::malformed("PDF has no pages"));
    }

    let mut warnings = WarningLog::new();
    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in page_numbers {
        let text = match pdf.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                warnings.push(
                    WarningKind::Extraction,
                    Some(number),
                    format!("page text could not be extracted: {e}"),
                );
                String::new()
            }
        };
        debug!(page = number, chars = text.len(), "extracted page text");
        pages.push(PageText::new(number, text));
    }

    let doc = SourceDocument::new(name, pages);
    info!(
        name,
        pages = doc.page_count(),
        chars = doc.char_count(),
        "loaded PDF document"
    );
    Ok((doc, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a minimal one-font PDF with one line of text per page.
    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn pdf_pages_extracted_in_order() {
        let bytes = pdf_with_pages(&[
            "Hemodialysis KES 10,650 per session, Level 4",
            "Hemodialysis KES 2,375 per session, Level 5",
        ]);
        let (doc, warnings) = document_from_pdf_bytes("tariffs.pdf", &bytes).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].number, 1);
        assert!(doc.pages[0].text.contains("10,650"));
        assert!(doc.pages[1].text.contains("2,375"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = document_from_pdf_bytes("bad.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, StoreError::MalformedInput { .. }));
    }

    #[test]
    fn text_split_on_form_feed() {
        let doc = document_from_text("t.txt", "page one\u{000C}page two\u{000C}").unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[1].text, "page two");
    }

    #[test]
    fn text_without_form_feed_is_one_page() {
        let doc = document_from_text("t.txt", "line one\nline two\n").unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn empty_text_is_malformed() {
        assert!(matches!(
            document_from_text("t.txt", "  \n\u{000C}\n"),
            Err(StoreError::MalformedInput { .. })
        ));
    }

    #[test]
    fn load_document_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("tariffs.txt");
        std::fs::write(&txt, "CT scan KES 8,000 Level 5").unwrap();
        let (doc, _) = load_document(&txt).unwrap();
        assert_eq!(doc.name, "tariffs.txt");
        assert_eq!(doc.page_count(), 1);

        let pdf = dir.path().join("tariffs.pdf");
        std::fs::write(&pdf, pdf_with_pages(&["CT scan KES 8,000 Level 5"])).unwrap();
        let (doc, _) = load_document(&pdf).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn invalid_utf8_text_is_malformed_with_page() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("tariffs.txt");
        std::fs::write(&txt, b"page one\x0cCT scan \xff KES 8,000").unwrap();

        let err = load_document(&txt).unwrap_err();
        assert!(matches!(err, StoreError::MalformedInput { page: Some(2), .. }));
        assert!(err.to_string().contains("(page 2)"));
    }

    #[test]
    fn load_document_missing_file() {
        let err = load_document(Path::new("/nonexistent/tariffs.pdf")).unwrap_err();
        assert!(matches!(err, StoreError::InputNotFound(_)));
    }
}
