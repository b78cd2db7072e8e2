//! PDF backends feeding the text extractor.

use super::ExtractionError;
use lopdf::Document;

/// Source of per-page text for a PDF byte stream.
///
/// Implementations return one entry per page in document order, `None` for pages that carry
/// no extractable text. They need not read past `max_pages`.
pub trait PdfBackend: Send + Sync {
    /// Parse `bytes` and return the text of up to `max_pages` leading pages.
    fn page_texts(
        &self,
        bytes: &[u8],
        max_pages: usize,
    ) -> Result<Vec<Option<String>>, ExtractionError>;
}

/// Pure-Rust backend built on `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl PdfBackend for LopdfBackend {
    fn page_texts(
        &self,
        bytes: &[u8],
        max_pages: usize,
    ) -> Result<Vec<Option<String>>, ExtractionError> {
        let document = Document::load_mem(bytes)
            .map_err(|error| ExtractionError::Unparseable(error.to_string()))?;

        // get_pages is keyed by page number, so iteration follows document order.
        let pages = document.get_pages();
        let texts = pages
            .keys()
            .take(max_pages)
            .map(|&page_number| match document.extract_text(&[page_number]) {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(error) => {
                    tracing::debug!(
                        page = page_number,
                        error = %error,
                        "Page text could not be decoded; skipping"
                    );
                    None
                }
            })
            .collect();

        Ok(texts)
    }
}
