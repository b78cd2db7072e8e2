#![deny(missing_docs)]

//! Core library for the PDF article summarizer.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Document processing metrics.
pub mod metrics;
/// Batch orchestration and result assembly.
pub mod processing;
/// LLM-backed structured summarization.
pub mod summarization;
