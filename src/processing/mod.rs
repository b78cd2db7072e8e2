//! Batch pipeline: content-type gate, text extraction, summarization, and result assembly.

pub mod assemble;
mod service;
pub mod types;

pub use assemble::{ResultRecord, assemble, assemble_batch};
pub use service::{ProcessingApi, ProcessingService};
pub use types::{
    BatchResult, Document, FailedItem, InputError, ItemResult, PDF_CONTENT_TYPE, ProcessingError,
    ServiceStatus, SuccessItem,
};
