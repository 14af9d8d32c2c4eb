//! PDF text extraction backed by `lopdf`.

use super::{DocumentFormat, ExtractionError, malformed};
use lopdf::Document;

/// Extract every page's text in page order and concatenate without separators.
pub(super) fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    Ok(extract_pages(bytes)?.concat())
}

/// Per-page text, one entry per page in page order.
///
/// A page whose content stream yields no text (for example a scanned image) or cannot be decoded
/// produces an empty entry instead of failing the whole document.
pub(super) fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let document =
        Document::load_mem(bytes).map_err(|error| malformed(DocumentFormat::Pdf, error))?;
    let pages = document.get_pages();
    tracing::debug!(pages = pages.len(), "Loaded PDF document");

    Ok(pages
        .into_keys()
        .map(|page_number| {
            document
                .extract_text(&[page_number])
                .unwrap_or_else(|error| {
                    tracing::warn!(
                        page = page_number,
                        %error,
                        "Failed to extract page text; treating page as empty"
                    );
                    String::new()
                })
        })
        .collect())
}
