//! Text extraction from uploaded PDF bytes.
//!
//! The extractor reads at most [`MAX_PAGES`] pages in order, joins whatever text each page
//! yields, and collapses every whitespace run into a single space. Pages without extractable
//! text (scanned images, undecodable fonts) are skipped. The normalized result must reach
//! [`MIN_TEXT_CHARS`] characters; shorter output is reported as insufficient text rather than
//! as a parse failure so callers can word the two cases differently.

mod pdf;

pub use pdf::{LopdfBackend, PdfBackend};

#[cfg(test)]
pub(crate) use pdf::fixtures as pdf_fixtures;

use std::sync::Arc;
use thiserror::Error;

/// Hard cap on the number of pages read from a document.
pub const MAX_PAGES: usize = 10;
/// Minimum normalized length, in characters, for extraction to count as successful.
pub const MIN_TEXT_CHARS: usize = 500;

/// Errors produced while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The byte stream could not be loaded as a PDF document.
    #[error("document could not be parsed as a PDF: {0}")]
    Unparseable(String),
    /// The document parsed but yielded too little text to summarize.
    #[error(
        "insufficient extractable text: {length} characters found, at least {minimum} required"
    )]
    InsufficientText {
        /// Normalized character count that was extracted.
        length: usize,
        /// Threshold the text had to reach.
        minimum: usize,
    },
}

/// Whitespace-normalized document text that passed the minimum length gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    text: String,
    char_len: usize,
}

impl ExtractedText {
    /// Normalize `raw` and enforce the [`MIN_TEXT_CHARS`] threshold.
    pub fn new(raw: &str) -> Result<Self, ExtractionError> {
        let text = normalize_whitespace(raw);
        let char_len = text.chars().count();
        if char_len < MIN_TEXT_CHARS {
            return Err(ExtractionError::InsufficientText {
                length: char_len,
                minimum: MIN_TEXT_CHARS,
            });
        }
        Ok(Self { text, char_len })
    }

    /// Borrow the normalized text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters (Unicode scalar values), not bytes.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Leading `max_chars` characters of the text.
    pub fn prefix(&self, max_chars: usize) -> &str {
        char_prefix(&self.text, max_chars)
    }
}

/// Collapse all whitespace runs, including newlines, into single spaces and trim both ends.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Longest prefix of `text` holding at most `max_chars` characters, cut on a char boundary.
pub(crate) fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Page-bounded text extractor over a pluggable PDF backend.
#[derive(Clone)]
pub struct TextExtractor {
    backend: Arc<dyn PdfBackend>,
}

impl TextExtractor {
    /// Build an extractor over the given backend.
    pub fn new(backend: Arc<dyn PdfBackend>) -> Self {
        Self { backend }
    }

    /// Extract and normalize the text of the first [`MAX_PAGES`] pages.
    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let pages = self.backend.page_texts(bytes, MAX_PAGES)?;
        let page_count = pages.len().min(MAX_PAGES);

        let mut joined = String::new();
        let mut pages_with_text = 0usize;
        for text in pages.into_iter().take(MAX_PAGES).flatten() {
            if text.trim().is_empty() {
                continue;
            }
            pages_with_text += 1;
            joined.push_str(&text);
            joined.push('\n');
        }

        tracing::debug!(
            pages_read = page_count,
            pages_with_text,
            raw_chars = joined.len(),
            "Extracted page text"
        );
        ExtractedText::new(&joined)
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(Arc::new(LopdfBackend))
    }
}
