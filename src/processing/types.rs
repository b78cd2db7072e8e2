//! Core data types and error definitions for the processing pipeline.

use crate::extraction::ExtractionError;
use crate::summarization::{SummarizationError, SummaryRecord};
use thiserror::Error;

/// The only declared content type accepted for summarization.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// An uploaded file awaiting processing.
#[derive(Debug, Clone)]
pub struct Document {
    /// Client-supplied file name, echoed back in the result.
    pub filename: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
    /// Declared MIME type, if the uploader sent one.
    pub content_type: Option<String>,
}

impl Document {
    /// Bundle an uploaded file.
    pub fn new(
        filename: impl Into<String>,
        content: Vec<u8>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content,
            content_type,
        }
    }

    /// Reject documents that must not reach extraction.
    pub fn validate(&self) -> Result<(), InputError> {
        if !is_pdf_content_type(self.content_type.as_deref()) {
            return Err(InputError::UnsupportedContentType(
                self.content_type
                    .clone()
                    .unwrap_or_else(|| "none".to_string()),
            ));
        }
        if self.content.is_empty() {
            return Err(InputError::EmptyFile);
        }
        Ok(())
    }
}

/// Whether a declared MIME type names PDF. Parameters and case are ignored.
pub fn is_pdf_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
}

/// Problems with an upload detected before extraction.
#[derive(Debug, Error)]
pub enum InputError {
    /// The declared content type is not PDF.
    #[error("unsupported content type `{0}`: only PDF files are accepted")]
    UnsupportedContentType(String),
    /// The upload carried no bytes.
    #[error("empty file")]
    EmptyFile,
}

/// Any reason a single document failed.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Upload rejected before extraction.
    #[error(transparent)]
    Input(#[from] InputError),
    /// Text extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Summary generation or validation failed.
    #[error(transparent)]
    Summarization(#[from] SummarizationError),
    /// Anything not anticipated above, including panics inside the pipeline.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl ProcessingError {
    /// Human-readable failure detail placed in a failed result.
    pub fn detail(&self) -> String {
        match self {
            Self::Input(error) => error.to_string(),
            Self::Extraction(ExtractionError::Unparseable(_)) => {
                "file could not be read as a PDF document".to_string()
            }
            Self::Extraction(error) => error.to_string(),
            Self::Summarization(SummarizationError::MalformedJson(_)) => {
                "the model responded with malformed or invalid JSON".to_string()
            }
            Self::Summarization(SummarizationError::SchemaViolation(problems)) => {
                format!("the model response did not match the summary schema: {problems}")
            }
            Self::Summarization(SummarizationError::ServiceError(cause)) => {
                format!("summarization service error: {cause}")
            }
            Self::Summarization(SummarizationError::Unavailable(_)) => {
                "summarization service is unavailable".to_string()
            }
            Self::Unknown(_) => "an unexpected server or API error occurred; check the logs".into(),
        }
    }
}

/// Successful outcome for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessItem {
    /// File name as uploaded.
    pub filename: String,
    /// Character length of the full extracted text.
    pub text_length: usize,
    /// Character length of the text actually submitted to the model.
    pub submitted_length: usize,
    /// Validated structured summary.
    pub summary: SummaryRecord,
    /// Model identifier that produced the summary.
    pub model_used: String,
    /// Leading slice of the extracted text, for display.
    pub extracted_text_sample: String,
}

/// Failed outcome for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// File name as uploaded.
    pub filename: String,
    /// Human-readable failure detail.
    pub detail: String,
}

/// Outcome of processing one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemResult {
    /// The document produced a validated summary.
    Success(SuccessItem),
    /// The document failed; the batch carried on.
    Failed(FailedItem),
}

impl ItemResult {
    /// File name of the document this result belongs to.
    pub fn filename(&self) -> &str {
        match self {
            Self::Success(item) => &item.filename,
            Self::Failed(item) => &item.filename,
        }
    }

    /// Whether the document produced a summary.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// One result per input document, in input order.
pub type BatchResult = Vec<ItemResult>;

/// Readiness of the summarization backend as seen by the outer API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServiceStatus {
    /// Whether a model client is configured.
    pub summarizer_available: bool,
    /// Configured model identifier, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Why the summarizer is unavailable, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarization::LlmClientError;
    use std::time::Duration;

    #[test]
    fn pdf_content_type_ignores_case_and_parameters() {
        assert!(is_pdf_content_type(Some("application/pdf")));
        assert!(is_pdf_content_type(Some("Application/PDF; name=a.pdf")));
        assert!(!is_pdf_content_type(Some("text/plain")));
        assert!(!is_pdf_content_type(Some("application/pdfx")));
        assert!(!is_pdf_content_type(None));
    }

    #[test]
    fn content_type_is_checked_before_emptiness() {
        let document = Document::new("notes.txt", Vec::new(), Some("text/plain".into()));
        assert!(matches!(
            document.validate(),
            Err(InputError::UnsupportedContentType(kind)) if kind == "text/plain"
        ));
    }

    #[test]
    fn empty_pdf_upload_is_rejected() {
        let document = Document::new("a.pdf", Vec::new(), Some(PDF_CONTENT_TYPE.into()));
        assert!(matches!(document.validate(), Err(InputError::EmptyFile)));
    }

    #[test]
    fn details_are_kind_specific() {
        let unsupported: ProcessingError =
            InputError::UnsupportedContentType("image/png".into()).into();
        assert!(unsupported.detail().contains("unsupported content type"));

        let short: ProcessingError = ExtractionError::InsufficientText {
            length: 12,
            minimum: 500,
        }
        .into();
        assert!(short.detail().contains("insufficient extractable text"));

        let timeout: ProcessingError = SummarizationError::ServiceError(LlmClientError::Timeout(
            Duration::from_secs(60),
        ))
        .into();
        assert!(timeout.detail().contains("timed out"));

        let unknown = ProcessingError::Unknown("boom".into());
        assert!(!unknown.detail().contains("boom"));
    }
}
