//! HTTP surface for the article summarizer.
//!
//! - `GET /` – Readiness message.
//! - `GET /health` – Whether the summarization backend is configured, and with which model.
//! - `POST /upload-pdf` – Summarize a single PDF sent as multipart field `file`. Failures map to
//!   HTTP status codes (400 for bad uploads or unreadable PDFs, 500 for model/service errors).
//! - `POST /summarize-pdfs` – Summarize many PDFs sent as repeated multipart field `files`.
//!   Always answers with one record per file, in upload order; failed files carry a `detail`.
//! - `GET /metrics` – Processed/succeeded/failed document counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Both upload endpoints answer 503 when the summarizer is unavailable (for example, no
//! `GEMINI_API_KEY`); that is the only condition that rejects a whole request.

use crate::extraction::ExtractionError;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    Document, InputError, ItemResult, ProcessingApi, ProcessingError, ResultRecord, ServiceStatus,
    assemble, assemble_batch,
};
use crate::summarization::SummarizationError;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router. `max_upload_bytes` bounds each request body.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: ProcessingApi + 'static,
{
    Router::new()
        .route("/", get(read_root))
        .route("/health", get(health::<S>))
        .route("/upload-pdf", post(upload_pdf::<S>))
        .route("/summarize-pdfs", post(summarize_pdfs::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

async fn read_root() -> Json<serde_json::Value> {
    Json(json!({ "message": "PDF summarization API is ready." }))
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    summarizer: ServiceStatus,
}

async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: ProcessingApi,
{
    Json(HealthResponse {
        status: "ok",
        summarizer: service.status(),
    })
}

/// Summarize one uploaded PDF.
///
/// Only the first `file` field is processed. The response is the success record itself;
/// every failure becomes an error status with a `detail` message.
async fn upload_pdf<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ResultRecord>, AppError>
where
    S: ProcessingApi,
{
    ensure_available(service.as_ref())?;
    let document = read_uploads(multipart, &["file"])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("no file uploaded in field `file`".into()))?;

    let success = service.process_one(document).await?;
    tracing::info!(filename = %success.filename, "Single upload summarized");
    Ok(Json(assemble(&ItemResult::Success(success))))
}

/// Summarize a batch of uploaded PDFs with per-file failure isolation.
async fn summarize_pdfs<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<Vec<ResultRecord>>, AppError>
where
    S: ProcessingApi,
{
    ensure_available(service.as_ref())?;
    let documents = read_uploads(multipart, &["files", "file"]).await?;
    if documents.is_empty() {
        return Err(AppError::BadRequest(
            "no files uploaded in field `files`".into(),
        ));
    }

    let results = service.process(documents).await;
    let succeeded = results.iter().filter(|result| result.is_success()).count();
    tracing::info!(
        files = results.len(),
        succeeded,
        "Batch upload completed"
    );
    Ok(Json(assemble_batch(&results)))
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

fn ensure_available<S: ProcessingApi + ?Sized>(service: &S) -> Result<(), AppError> {
    let status = service.status();
    if status.summarizer_available {
        return Ok(());
    }
    let reason = status
        .unavailable_reason
        .unwrap_or_else(|| "no summarization backend configured".into());
    tracing::warn!(reason = %reason, "Rejecting request: summarizer unavailable");
    Err(AppError::Unavailable(format!(
        "LLM client could not be initialized ({reason}); check the server logs"
    )))
}

/// Collect uploaded files from the named multipart fields, in upload order.
async fn read_uploads(
    mut multipart: Multipart,
    field_names: &[&str],
) -> Result<Vec<Document>, AppError> {
    let mut documents = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if !field_names.contains(&name.as_str()) {
            tracing::debug!(field = %name, "Ignoring unexpected multipart field");
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}", documents.len() + 1));
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        tracing::debug!(
            filename = %filename,
            content_type = ?content_type,
            bytes = bytes.len(),
            "Received upload"
        );
        documents.push(Document::new(filename, bytes.to_vec(), content_type));
    }
    Ok(documents)
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_fields: Option<&'static [&'static str]>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload_pdf",
                method: "POST",
                path: "/upload-pdf",
                description: "Summarize one PDF article (multipart field `file`). Returns a single record with status, text_length, summary, model_used and extracted_text_sample.",
                form_fields: Some(&["file"]),
            },
            CommandDescriptor {
                name: "summarize_pdfs",
                method: "POST",
                path: "/summarize-pdfs",
                description: "Summarize several PDF articles (repeated multipart field `files`). Returns one record per file in upload order; failed files carry status Failed and a detail message.",
                form_fields: Some(&["files"]),
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Report whether the summarization backend is configured and which model it uses.",
                form_fields: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return processed, succeeded and failed document counters.",
                form_fields: None,
            },
        ],
    })
}

enum AppError {
    Unavailable(String),
    BadRequest(String),
    Upload(MultipartError),
    Processing(ProcessingError),
}

impl AppError {
    fn status_and_detail(self) -> (StatusCode, String) {
        match self {
            Self::Unavailable(detail) => (StatusCode::SERVICE_UNAVAILABLE, detail),
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::Upload(error) => (error.status(), error.body_text()),
            Self::Processing(error) => {
                let status = match &error {
                    ProcessingError::Input(InputError::UnsupportedContentType(_))
                    | ProcessingError::Input(InputError::EmptyFile)
                    | ProcessingError::Extraction(ExtractionError::Unparseable(_))
                    | ProcessingError::Extraction(ExtractionError::InsufficientText { .. }) => {
                        StatusCode::BAD_REQUEST
                    }
                    ProcessingError::Summarization(SummarizationError::Unavailable(_)) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    ProcessingError::Summarization(_) | ProcessingError::Unknown(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, error.detail())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Upload(inner)
    }
}
