//! Processing service coordinating extraction, summarization, and per-document isolation.

use crate::{
    config::Config,
    extraction::TextExtractor,
    metrics::{MetricsSnapshot, SummaryMetrics},
    processing::types::{
        BatchResult, Document, FailedItem, ItemResult, ProcessingError, ServiceStatus, SuccessItem,
    },
    summarization::{Summarizer, prompt::MAX_INPUT_CHARS},
};
use async_trait::async_trait;
use futures_util::{FutureExt, StreamExt, stream};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Characters of extracted text echoed back in a successful result.
const SAMPLE_CHARS: usize = 300;

/// Runs documents through extraction and summarization.
///
/// Every document is an isolated unit of work: whatever goes wrong with one (bad upload,
/// unreadable PDF, bad model output, service failure, even a panic) becomes a failed result
/// for that document alone. Batches always return one result per input, in input order.
/// Construct once at startup and share through an `Arc`.
pub struct ProcessingService {
    extractor: TextExtractor,
    summarizer: Summarizer,
    metrics: Arc<SummaryMetrics>,
    concurrency: usize,
}

/// Abstraction over the pipeline used by the HTTP surface and the CLI.
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Process a batch; always yields exactly one result per document, in order.
    async fn process(&self, documents: Vec<Document>) -> BatchResult;

    /// Process one document, surfacing the typed error on failure.
    async fn process_one(&self, document: Document) -> Result<SuccessItem, ProcessingError>;

    /// Readiness of the summarization backend.
    fn status(&self) -> ServiceStatus;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Assemble a service from its collaborators. `concurrency` is clamped to at least one.
    pub fn new(extractor: TextExtractor, summarizer: Summarizer, concurrency: usize) -> Self {
        Self {
            extractor,
            summarizer,
            metrics: Arc::new(SummaryMetrics::new()),
            concurrency: concurrency.max(1),
        }
    }

    /// Build the production pipeline: `lopdf` extraction and a Gemini summarizer.
    pub fn from_config(config: &Config) -> Self {
        tracing::info!("Initializing summarization client");
        let summarizer = Summarizer::from_config(config);
        Self::new(
            TextExtractor::default(),
            summarizer,
            config.batch_concurrency,
        )
    }

    /// Process a batch of documents.
    ///
    /// Up to `concurrency` documents are in flight at once; results are yielded in input
    /// order regardless of completion order.
    pub async fn process(&self, documents: Vec<Document>) -> BatchResult {
        let batch_id = Uuid::new_v4();
        let total = documents.len();
        tracing::info!(
            %batch_id,
            documents = total,
            concurrency = self.concurrency,
            "Processing batch"
        );

        let results: BatchResult = stream::iter(documents.into_iter().enumerate())
            .map(|(index, document)| {
                let span = tracing::info_span!(
                    "document",
                    %batch_id,
                    index,
                    filename = %document.filename
                );
                self.process_isolated(document).instrument(span)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let succeeded = results.iter().filter(|result| result.is_success()).count();
        tracing::info!(
            %batch_id,
            documents = total,
            succeeded,
            failed = total - succeeded,
            "Batch complete"
        );
        results
    }

    /// Process one document, converting panics into [`ProcessingError::Unknown`].
    pub async fn process_one(&self, document: Document) -> Result<SuccessItem, ProcessingError> {
        tracing::info!(filename = %document.filename, "Processing document");
        let outcome = match AssertUnwindSafe(self.run_pipeline(document))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => Err(ProcessingError::Unknown(panic_message(&*panic))),
        };

        match &outcome {
            Ok(success) => {
                self.metrics.record_success();
                tracing::info!(
                    filename = %success.filename,
                    text_length = success.text_length,
                    submitted_length = success.submitted_length,
                    "Document summarized"
                );
            }
            Err(error @ ProcessingError::Unknown(_)) => {
                self.metrics.record_failure();
                tracing::error!(error = %error, "Document failed unexpectedly");
            }
            Err(error) => {
                self.metrics.record_failure();
                tracing::warn!(error = %error, "Document failed");
            }
        }
        outcome
    }

    /// Readiness of the summarization backend.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            summarizer_available: self.summarizer.is_available(),
            model: self.summarizer.model().map(str::to_string),
            unavailable_reason: self.summarizer.unavailable_reason().map(str::to_string),
        }
    }

    /// Return the current processing metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn process_isolated(&self, document: Document) -> ItemResult {
        let filename = document.filename.clone();
        match self.process_one(document).await {
            Ok(success) => ItemResult::Success(success),
            Err(error) => ItemResult::Failed(FailedItem {
                filename,
                detail: error.detail(),
            }),
        }
    }

    async fn run_pipeline(&self, document: Document) -> Result<SuccessItem, ProcessingError> {
        document.validate()?;
        let Document {
            filename, content, ..
        } = document;

        let extractor = self.extractor.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&content))
            .await
            .map_err(|error| {
                if error.is_panic() {
                    ProcessingError::Unknown(format!(
                        "text extraction panicked: {}",
                        panic_message(&*error.into_panic())
                    ))
                } else {
                    ProcessingError::Unknown(format!("text extraction task failed: {error}"))
                }
            })??;
        tracing::debug!(text_length = text.char_len(), "Text extracted");

        let summary = self.summarizer.summarize(text.as_str()).await?;

        Ok(SuccessItem {
            filename,
            text_length: text.char_len(),
            submitted_length: text.char_len().min(MAX_INPUT_CHARS),
            summary,
            model_used: self.summarizer.model().unwrap_or_default().to_string(),
            extracted_text_sample: format!("{}...", text.prefix(SAMPLE_CHARS)),
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn process(&self, documents: Vec<Document>) -> BatchResult {
        ProcessingService::process(self, documents).await
    }

    async fn process_one(&self, document: Document) -> Result<SuccessItem, ProcessingError> {
        ProcessingService::process_one(self, document).await
    }

    fn status(&self) -> ServiceStatus {
        ProcessingService::status(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractionError, PdfBackend};
    use crate::processing::types::PDF_CONTENT_TYPE;
    use crate::summarization::testing::{StubLlm, StubReply, valid_response};
    use std::time::Duration;

    /// Reads `PDF:<text>` payloads as a single page; `PANIC` panics; anything else is corrupt.
    struct TextBackend;

    impl PdfBackend for TextBackend {
        fn page_texts(
            &self,
            bytes: &[u8],
            _max_pages: usize,
        ) -> Result<Vec<Option<String>>, ExtractionError> {
            if bytes == b"PANIC" {
                panic!("backend exploded");
            }
            let body = std::str::from_utf8(bytes)
                .ok()
                .and_then(|text| text.strip_prefix("PDF:"))
                .ok_or_else(|| ExtractionError::Unparseable("missing header".into()))?;
            Ok(vec![Some(body.to_string())])
        }
    }

    fn pdf(name: &str, text_chars: usize) -> Document {
        let body = format!("PDF:{}", "w".repeat(text_chars));
        Document::new(name, body.into_bytes(), Some(PDF_CONTENT_TYPE.into()))
    }

    fn raw(name: &str, bytes: &[u8], content_type: &str) -> Document {
        Document::new(name, bytes.to_vec(), Some(content_type.into()))
    }

    fn service(stub: Arc<StubLlm>, concurrency: usize, timeout: Duration) -> ProcessingService {
        ProcessingService::new(
            TextExtractor::new(Arc::new(TextBackend)),
            Summarizer::new(stub, "Turkish", timeout),
            concurrency,
        )
    }

    fn detail(result: &ItemResult) -> &str {
        match result {
            ItemResult::Failed(failed) => &failed.detail,
            ItemResult::Success(success) => panic!("expected failure for {}", success.filename),
        }
    }

    #[tokio::test]
    async fn well_formed_document_succeeds() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(valid_response())));
        let service = service(stub, 1, Duration::from_secs(5));

        let results = service.process(vec![pdf("paper.pdf", 2_000)]).await;

        let [ItemResult::Success(success)] = results.as_slice() else {
            panic!("expected one success, got {results:?}");
        };
        assert_eq!(success.filename, "paper.pdf");
        assert_eq!(success.text_length, 2_000);
        assert_eq!(success.submitted_length, 2_000);
        assert_eq!(success.model_used, "stub-model");
        assert_eq!(success.extracted_text_sample, format!("{}...", "w".repeat(300)));
    }

    #[tokio::test]
    async fn long_text_reports_truncated_submission() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(valid_response())));
        let service = service(stub, 1, Duration::from_secs(5));

        let success = service
            .process_one(pdf("long.pdf", 20_000))
            .await
            .expect("success");
        assert_eq!(success.text_length, 20_000);
        assert_eq!(success.submitted_length, 15_000);
    }

    #[tokio::test]
    async fn every_failure_kind_is_isolated_from_the_good_document() {
        let stub = Arc::new(StubLlm::scripted(
            vec![
                StubReply::Text("definitely not json".into()),
                StubReply::Text(r#"{"veri_seti": "only one field"}"#.into()),
                StubReply::Hang,
            ],
            StubReply::Text(valid_response()),
        ));
        let service = service(stub, 1, Duration::from_millis(100));

        let documents = vec![
            raw("notes.txt", b"plain text", "text/plain"),
            pdf("short.pdf", 499),
            raw("corrupt.pdf", b"\x00\x01garbage", PDF_CONTENT_TYPE),
            pdf("bad-json.pdf", 800),
            pdf("bad-schema.pdf", 800),
            pdf("timeout.pdf", 800),
            raw("panic.pdf", b"PANIC", PDF_CONTENT_TYPE),
            raw("empty.pdf", b"", PDF_CONTENT_TYPE),
            pdf("good.pdf", 800),
        ];
        let names: Vec<String> = documents.iter().map(|doc| doc.filename.clone()).collect();

        let results = service.process(documents).await;

        assert_eq!(results.len(), names.len());
        for (result, name) in results.iter().zip(&names) {
            assert_eq!(result.filename(), name);
        }
        assert!(detail(&results[0]).contains("unsupported content type"));
        assert!(detail(&results[1]).contains("insufficient extractable text"));
        assert!(detail(&results[2]).contains("could not be read as a PDF"));
        assert!(detail(&results[3]).contains("malformed"));
        assert!(detail(&results[4]).contains("summary schema"));
        assert!(detail(&results[5]).contains("timed out"));
        assert!(detail(&results[6]).contains("unexpected"));
        assert_eq!(detail(&results[7]), "empty file");
        assert!(results[8].is_success());

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.documents_processed, 9);
        assert_eq!(snapshot.documents_succeeded, 1);
        assert_eq!(snapshot.documents_failed, 8);
    }

    #[tokio::test]
    async fn minimum_length_gate_is_inclusive() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(valid_response())));
        let service = service(stub.clone(), 1, Duration::from_secs(5));

        let results = service
            .process(vec![pdf("499.pdf", 499), pdf("500.pdf", 500)])
            .await;

        assert!(!results[0].is_success());
        assert!(results[1].is_success());
        assert_eq!(stub.requests.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn corrupted_middle_document_does_not_affect_neighbours() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(valid_response())));
        let service = service(stub, 1, Duration::from_secs(5));

        let results = service
            .process(vec![
                pdf("one.pdf", 900),
                raw("two.pdf", b"%PDF-1.7 truncated", PDF_CONTENT_TYPE),
                pdf("three.pdf", 900),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[2].is_success());
    }

    #[tokio::test]
    async fn concurrent_batches_preserve_input_order() {
        let stub = Arc::new(StubLlm::scripted(
            vec![
                StubReply::Delayed(Duration::from_millis(150), valid_response()),
                StubReply::Delayed(Duration::from_millis(75), valid_response()),
            ],
            StubReply::Text(valid_response()),
        ));
        let service = service(stub, 4, Duration::from_secs(5));

        let documents: Vec<Document> = (0..8)
            .map(|index| {
                if index % 3 == 1 {
                    raw(&format!("doc-{index}.pdf"), b"corrupt", PDF_CONTENT_TYPE)
                } else {
                    pdf(&format!("doc-{index}.pdf"), 600 + index)
                }
            })
            .collect();

        let results = service.process(documents).await;

        assert_eq!(results.len(), 8);
        for (index, result) in results.iter().enumerate() {
            assert_eq!(result.filename(), format!("doc-{index}.pdf"));
            assert_eq!(result.is_success(), index % 3 != 1);
        }
    }

    #[tokio::test]
    async fn empty_batch_returns_empty_result() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(valid_response())));
        let results = service(stub, 2, Duration::from_secs(5)).process(Vec::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn unavailable_summarizer_fails_each_document() {
        let service = ProcessingService::new(
            TextExtractor::new(Arc::new(TextBackend)),
            Summarizer::unavailable("GEMINI_API_KEY is not configured"),
            1,
        );
        assert!(!service.status().summarizer_available);

        let results = service
            .process(vec![pdf("a.pdf", 700), pdf("b.pdf", 700)])
            .await;

        assert_eq!(results.len(), 2);
        assert!(
            results
                .iter()
                .all(|result| detail(result).contains("unavailable"))
        );
    }

    #[tokio::test]
    async fn panicking_model_call_is_contained() {
        let stub = Arc::new(StubLlm::scripted(
            vec![StubReply::Panic],
            StubReply::Text(valid_response()),
        ));
        let service = service(stub, 1, Duration::from_secs(5));

        let results = service
            .process(vec![pdf("boom.pdf", 700), pdf("fine.pdf", 700)])
            .await;

        assert!(detail(&results[0]).contains("unexpected"));
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn real_pdfs_flow_through_lopdf_extraction() {
        use crate::extraction::pdf_fixtures::{article_text, build_pdf};

        let stub = Arc::new(StubLlm::always(StubReply::Text(format!(
            "```json\n{}\n```",
            valid_response()
        ))));
        let service = ProcessingService::new(
            TextExtractor::default(),
            Summarizer::new(stub, "Turkish", Duration::from_secs(5)),
            1,
        );

        let page = article_text(700);
        let documents = vec![
            Document::new(
                "article.pdf",
                build_pdf(&[&page, &page, &page]),
                Some(PDF_CONTENT_TYPE.into()),
            ),
            Document::new(
                "scanned.pdf",
                build_pdf(&["", "", ""]),
                Some(PDF_CONTENT_TYPE.into()),
            ),
        ];

        let results = service.process(documents).await;

        let ItemResult::Success(success) = &results[0] else {
            panic!("expected success, got {:?}", results[0]);
        };
        assert!(success.text_length >= 2_000);
        assert_eq!(success.summary.kategori, "CV");
        assert!(detail(&results[1]).contains("insufficient extractable text"));
    }
}
