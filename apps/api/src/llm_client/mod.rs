//! LLM client: the single point of entry for all Gemini API calls.
//!
//! The API key is supplied by the caller on every request. It is passed
//! through as an `&ApiKey`, never stored on the client, never logged.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("API key was rejected")]
    InvalidCredential,

    #[error("LLM returned empty content")]
    EmptyResponse,
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    /// Rejected keys and malformed requests (4xx other than 429) are final.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::EmptyResponse => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::InvalidCredential => false,
        }
    }
}

/// Caller-supplied Gemini credential. `Debug` is redacted and there is no
/// `Display`, so the key cannot end up in a log line by accident.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Binds a raw key for use in outbound requests. Fails with
    /// `InvalidCredential` when the key cannot be sent as a header value.
    pub fn new(raw: &str) -> Result<Self, LlmError> {
        let key = raw.trim();
        if key.is_empty() || HeaderValue::from_str(key).is_err() {
            return Err(LlmError::InvalidCredential);
        }
        Ok(ApiKey(key.to_string()))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// The model seam. `AppState` carries an `Arc<dyn ModelClient>` so handlers
/// and the retry loop can be exercised with a fake.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Submits one prompt and returns the model's raw text answer.
    async fn generate(&self, api_key: &ApiKey, prompt: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: String,
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiClient
// ────────────────────────────────────────────────────────────────────────────

/// Production `ModelClient` backed by the Gemini `generateContent` REST call.
/// Makes exactly one attempt per `generate`; retries live in the analysis layer.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_base: &str, model: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{model}:generateContent",
                api_base.trim_end_matches('/')
            ),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, api_key: &ApiKey, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key.expose())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<GeminiError>(&body).ok();

            if is_credential_rejection(status.as_u16(), parsed.as_ref()) {
                warn!("Gemini rejected the supplied API key (status {status})");
                return Err(LlmError::InvalidCredential);
            }

            let message = parsed.map(|e| e.error.message).unwrap_or(body);
            warn!("Gemini API returned {status}: {message}");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        match parsed.text() {
            Some(text) => Ok(text),
            None => {
                let block_reason = parsed
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.as_deref());
                let finish_reason = parsed
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref());
                warn!(?block_reason, ?finish_reason, "Gemini returned no text");
                Err(LlmError::EmptyResponse)
            }
        }
    }
}

fn is_credential_rejection(status: u16, error: Option<&GeminiError>) -> bool {
    match status {
        401 | 403 => true,
        400 => error.is_some_and(|e| {
            e.error.message.contains("API key") || e.error.status == "UNAUTHENTICATED"
        }),
        _ => false,
    }
}

/// Removes a markdown code-fence wrapper (```` ```json ````, any other info
/// tag, or a bare ```` ``` ````) around a model answer. Unfenced text is only
/// trimmed.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim_start();
    body.strip_suffix("```").unwrap_or(body).trim()
}
