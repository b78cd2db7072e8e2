//! Structured article summaries from a hosted language model.
//!
//! [`Summarizer`] owns the whole request/response cycle: it bounds the input, builds the
//! prompt, asks the model for schema-constrained JSON, strips any markdown fence the model
//! wraps around its answer, and validates the result into a [`SummaryRecord`]. The model
//! itself sits behind the [`LlmClient`] trait and is injected at construction time; a
//! summarizer built without a client stays in an explicit unavailable state.

mod gemini;
pub mod prompt;
pub mod record;

pub use gemini::GeminiClient;
pub use record::{SUMMARY_FIELDS, SummaryRecord, parse_summary, strip_code_fences};

use crate::config::Config;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a language-model client.
#[derive(Debug, Error)]
pub enum LlmClientError {
    /// Provider could not be reached or the client could not be built.
    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider answered with an error status.
    #[error("LLM generation failed: {0}")]
    GenerationFailed(String),
    /// Provider answered, but the response envelope was unusable.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// The call did not finish within the configured limit.
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

/// Prompt pair and optional response schema passed to a model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Instruction framing the task.
    pub system_prompt: String,
    /// User turn carrying the article text.
    pub user_prompt: String,
    /// JSON schema the response should conform to, when the provider supports it.
    pub response_schema: Option<serde_json::Value>,
}

/// Interface implemented by hosted language-model backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion and return the model's raw text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmClientError>;

    /// Model identifier reported alongside successful summaries.
    fn model(&self) -> &str;
}

/// Reasons a summary could not be produced for a document.
#[derive(Debug, Error)]
pub enum SummarizationError {
    /// No language-model client is configured.
    #[error("summarization service unavailable: {0}")]
    Unavailable(String),
    /// The response was not parseable as JSON after fence stripping.
    #[error("model returned malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    /// The JSON parsed but did not match the summary schema.
    #[error("model response violates the summary schema: {0}")]
    SchemaViolation(String),
    /// The call to the language-model service failed.
    #[error("summarization service call failed: {0}")]
    ServiceError(#[from] LlmClientError),
}

enum ClientState {
    Ready(Arc<dyn LlmClient>),
    Unavailable(String),
}

/// Produces validated [`SummaryRecord`]s from extracted article text.
pub struct Summarizer {
    state: ClientState,
    language: String,
    timeout: Duration,
}

impl Summarizer {
    /// Build a summarizer around an injected client.
    pub fn new(client: Arc<dyn LlmClient>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            state: ClientState::Ready(client),
            language: language.into(),
            timeout,
        }
    }

    /// Build a summarizer that rejects every call with [`SummarizationError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ClientState::Unavailable(reason.into()),
            language: String::new(),
            timeout: Duration::ZERO,
        }
    }

    /// Build a Gemini-backed summarizer from configuration.
    ///
    /// A missing API key or an HTTP client that fails to build leaves the summarizer
    /// unavailable instead of aborting startup.
    pub fn from_config(config: &Config) -> Self {
        let Some(api_key) = config.gemini_api_key.clone() else {
            tracing::warn!("GEMINI_API_KEY is not set; summarization is unavailable");
            return Self::unavailable("GEMINI_API_KEY is not configured");
        };

        match GeminiClient::new(
            &config.gemini_base_url,
            api_key,
            &config.gemini_model,
            config.summary_timeout(),
        ) {
            Ok(client) => {
                tracing::info!(model = %config.gemini_model, "Gemini client ready");
                Self::new(
                    Arc::new(client),
                    config.summary_language.clone(),
                    config.summary_timeout(),
                )
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to initialize Gemini client");
                Self::unavailable(error.to_string())
            }
        }
    }

    /// Whether a client is configured.
    pub fn is_available(&self) -> bool {
        matches!(self.state, ClientState::Ready(_))
    }

    /// Identifier of the configured model, if any.
    pub fn model(&self) -> Option<&str> {
        match &self.state {
            ClientState::Ready(client) => Some(client.model()),
            ClientState::Unavailable(_) => None,
        }
    }

    /// Reason the summarizer is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            ClientState::Ready(_) => None,
            ClientState::Unavailable(reason) => Some(reason),
        }
    }

    /// Summarize `text`, submitting at most [`prompt::MAX_INPUT_CHARS`] characters.
    ///
    /// Makes exactly one call to the model; failures are returned, never retried.
    pub async fn summarize(&self, text: &str) -> Result<SummaryRecord, SummarizationError> {
        let client = match &self.state {
            ClientState::Ready(client) => client,
            ClientState::Unavailable(reason) => {
                return Err(SummarizationError::Unavailable(reason.clone()));
            }
        };

        let input = prompt::truncate_input(text);
        tracing::debug!(
            model = client.model(),
            submitted_chars = input.chars().count(),
            "Requesting structured summary"
        );

        let request = CompletionRequest {
            system_prompt: prompt::system_instruction(&self.language),
            user_prompt: prompt::user_prompt(input),
            response_schema: Some(record::response_schema()),
        };

        let raw = tokio::time::timeout(self.timeout, client.complete(request))
            .await
            .map_err(|_| LlmClientError::Timeout(self.timeout))??;

        parse_summary(&raw).inspect_err(|error| {
            tracing::warn!(error = %error, response_chars = raw.len(), "Rejected model response");
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{StubLlm, StubReply, valid_response};
    use super::*;

    fn summarizer(stub: Arc<StubLlm>) -> Summarizer {
        Summarizer::new(stub, "Turkish", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn valid_response_becomes_record() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(valid_response())));
        let record = summarizer(stub.clone())
            .summarize("article body")
            .await
            .expect("summary");
        assert_eq!(record.kategori, "CV");

        let requests = stub.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system_prompt.contains("in Turkish"));
        assert!(requests[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn fenced_response_is_unwrapped() {
        let fenced = format!("```json\n{}\n```", valid_response());
        let stub = Arc::new(StubLlm::always(StubReply::Text(fenced)));
        let record = summarizer(stub).summarize("text").await.expect("summary");
        assert_eq!(record.veri_seti, "CIFAR-10");
    }

    #[tokio::test]
    async fn submitted_text_is_first_fifteen_thousand_chars() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(valid_response())));
        let summarizer = summarizer(stub.clone());
        let text: String = "0123456789".repeat(2_000);

        summarizer.summarize(&text).await.expect("first");
        summarizer.summarize(&text).await.expect("second");

        let requests = stub.requests.lock().await;
        let expected = prompt::user_prompt(&text[..15_000]);
        assert_eq!(requests[0].user_prompt, expected);
        assert_eq!(requests[0].user_prompt, requests[1].user_prompt);
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let stub = Arc::new(StubLlm::always(StubReply::Text("not json".into())));
        let error = summarizer(stub).summarize("text").await.expect_err("error");
        assert!(matches!(error, SummarizationError::MalformedJson(_)));
    }

    #[tokio::test]
    async fn incomplete_object_is_schema_violation() {
        let stub = Arc::new(StubLlm::always(StubReply::Text(
            r#"{"veri_seti":"x"}"#.into(),
        )));
        let error = summarizer(stub).summarize("text").await.expect_err("error");
        assert!(matches!(error, SummarizationError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn client_error_is_service_error() {
        let stub = Arc::new(StubLlm::always(StubReply::Error(|| {
            LlmClientError::GenerationFailed("quota exceeded".into())
        })));
        let error = summarizer(stub.clone())
            .summarize("text")
            .await
            .expect_err("error");
        assert!(matches!(
            error,
            SummarizationError::ServiceError(LlmClientError::GenerationFailed(_))
        ));
        assert_eq!(stub.requests.lock().await.len(), 1, "no retries");
    }

    #[tokio::test]
    async fn hung_call_times_out_as_service_error() {
        let stub = Arc::new(StubLlm::always(StubReply::Hang));
        let summarizer = Summarizer::new(stub, "Turkish", Duration::from_millis(50));
        let error = summarizer.summarize("text").await.expect_err("timeout");
        assert!(matches!(
            error,
            SummarizationError::ServiceError(LlmClientError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn unavailable_summarizer_rejects_calls() {
        let summarizer = Summarizer::unavailable("no key");
        assert!(!summarizer.is_available());
        assert_eq!(summarizer.model(), None);
        assert_eq!(summarizer.unavailable_reason(), Some("no key"));
        let error = summarizer.summarize("text").await.expect_err("unavailable");
        assert!(matches!(error, SummarizationError::Unavailable(_)));
    }

    #[test]
    fn config_without_key_is_unavailable() {
        let summarizer = Summarizer::from_config(&Config::default());
        assert!(!summarizer.is_available());
    }

    #[test]
    fn config_with_key_is_available() {
        let config = Config {
            gemini_api_key: Some("test-key".into()),
            ..Config::default()
        };
        let summarizer = Summarizer::from_config(&config);
        assert!(summarizer.is_available());
        assert_eq!(summarizer.model(), Some("gemini-2.0-flash"));
    }
}
