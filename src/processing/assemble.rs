//! Mapping from pipeline outcomes to the uniform output record.

use super::types::ItemResult;
use crate::summarization::SummaryRecord;
use serde::Serialize;

/// Output record for one document, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum ResultRecord {
    /// The document was summarized.
    Success {
        /// File name as uploaded.
        filename: String,
        /// Character length of the extracted text.
        text_length: usize,
        /// Validated summary.
        summary: SummaryRecord,
        /// Model identifier that produced the summary.
        model_used: String,
        /// Leading slice of the extracted text.
        extracted_text_sample: String,
    },
    /// The document failed.
    Failed {
        /// File name as uploaded.
        filename: String,
        /// Human-readable failure detail.
        detail: String,
    },
}

/// Format one outcome as an output record.
pub fn assemble(item: &ItemResult) -> ResultRecord {
    match item {
        ItemResult::Success(success) => ResultRecord::Success {
            filename: success.filename.clone(),
            text_length: success.text_length,
            summary: success.summary.clone(),
            model_used: success.model_used.clone(),
            extracted_text_sample: success.extracted_text_sample.clone(),
        },
        ItemResult::Failed(failed) => ResultRecord::Failed {
            filename: failed.filename.clone(),
            detail: failed.detail.clone(),
        },
    }
}

/// Format a whole batch, preserving order.
pub fn assemble_batch(items: &[ItemResult]) -> Vec<ResultRecord> {
    items.iter().map(assemble).collect()
}
