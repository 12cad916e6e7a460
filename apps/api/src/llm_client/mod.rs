/// LLM Client — the single point of entry for all Gemini API calls in AutoCV.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through this module.
///
/// Model: gemini-3-pro-preview (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls in AutoCV.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-3-pro-preview";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ────────────────────────────────────────────────────────────────────────────

/// A single content part: text or inline binary data (base64).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData", rename_all = "camelCase")]
    InlineData { mime_type: String, data: String },
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text(s.into())
    }

    /// Encodes raw bytes as a base64 inline-data part.
    pub fn inline_data(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        use base64::Engine;
        Part::InlineData {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

/// Per-exchange generation config. `response_schema` constrains the reply to a
/// declared field set (Gemini structured-output mode); `response_mime_type`
/// of `application/json` requests a bare JSON body without prose.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl GenerationConfig {
    pub fn json() -> Self {
        GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: None,
        }
    }

    pub fn json_with_schema(schema: Value) -> Self {
        GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
        }
    }
}

/// One outbound exchange: the user parts plus optional generation config.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub parts: Vec<Part>,
    pub config: Option<GenerationConfig>,
}

impl ExchangeRequest {
    pub fn text(s: impl Into<String>) -> Self {
        ExchangeRequest {
            parts: vec![Part::text(s)],
            config: None,
        }
    }

    pub fn parts(parts: Vec<Part>) -> Self {
        ExchangeRequest {
            parts,
            config: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: &'a Content,
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Extracts the text of the first candidate's text parts, concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if text.is_empty() {
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
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by all services in AutoCV.
/// Stateless; conversational state lives in `ChatSession`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Opens a multi-turn chat session under the given system instruction.
    /// The session owns the transcript; every subsequent exchange is sent with
    /// the full accumulated history so later turns see earlier output.
    pub fn start_chat(&self, system_instruction: impl Into<String>) -> ChatSession {
        ChatSession {
            client: self.clone(),
            system_instruction: Content {
                role: "user".to_string(),
                parts: vec![Part::text(system_instruction)],
            },
            history: Vec::new(),
        }
    }

    async fn generate(
        &self,
        system_instruction: &Content,
        contents: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<String, LlmError> {
        let url = format!("{GEMINI_API_BASE}/{MODEL}:generateContent");
        let request_body = GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: config,
        };

        // Exactly one attempt per exchange. Callers wanting resilience add
        // retry at their own boundary, not here.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={:?}, candidate_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chat session
// ────────────────────────────────────────────────────────────────────────────

/// The conversational seam. `ChatSession` is the production implementation;
/// tests drive the workflow and assistant with scripted fakes.
#[async_trait]
pub trait Conversation: Send {
    /// Sends one user turn and returns the model's reply text.
    async fn exchange(&mut self, request: ExchangeRequest) -> Result<String, LlmError>;
}

/// A stateful conversation: system instruction fixed at creation, transcript
/// accumulated across exchanges. A failed exchange leaves the transcript
/// untouched, so the session stays usable for the next turn.
pub struct ChatSession {
    client: LlmClient,
    system_instruction: Content,
    history: Vec<Content>,
}

#[async_trait]
impl Conversation for ChatSession {
    async fn exchange(&mut self, request: ExchangeRequest) -> Result<String, LlmError> {
        let user_turn = Content {
            role: "user".to_string(),
            parts: request.parts,
        };

        let mut contents = self.history.clone();
        contents.push(user_turn.clone());

        let reply = self
            .client
            .generate(&self.system_instruction, &contents, request.config.as_ref())
            .await?;

        self.history.push(user_turn);
        self.history.push(Content {
            role: "model".to_string(),
            parts: vec![Part::text(reply.clone())],
        });

        Ok(reply)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
