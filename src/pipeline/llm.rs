//! Completion-endpoint client: send the prompt, classify the outcome.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] so it can change without touching the transport or
//! retry logic here.
//!
//! ## Retry strategy
//!
//! The HTTP call is wrapped in [`crate::retry::run`] with the network
//! profile (3 attempts, 2 s base delay) and [`ApiError::is_retryable`] as
//! the eligibility predicate: 5xx, transport failures, and 429s are
//! re-attempted with exponential backoff; 400/401/402 and decoding failures
//! propagate immediately. When every attempt fails, the last observed error
//! is surfaced.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DeckConfig;
use crate::error::{ApiError, DeckError};
use crate::output::TokenUsage;
use crate::prompts::RequestPayload;
use crate::retry::{self, RetryProfile};

/// The raw model reply: concatenated text blocks plus token accounting.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    pub text: String,
    pub usage: TokenUsage,
}

/// Client for an Anthropic-style `/v1/messages` completion endpoint.
pub struct SummarizationClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_version: String,
    model: String,
    max_output_tokens: usize,
    retry: RetryProfile,
}

impl SummarizationClient {
    pub fn new(config: &DeckConfig) -> Result<Self, DeckError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| DeckError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            retry: config.network_retry,
        })
    }

    /// Issue the completion request, retrying transient failures.
    pub async fn summarize(&self, payload: &RequestPayload) -> Result<CompletionReply, ApiError> {
        retry::run(self.retry, ApiError::is_retryable, || self.send_once(payload)).await
    }

    /// One attempt: POST, map the status, decode the body.
    async fn send_once(&self, payload: &RequestPayload) -> Result<CompletionReply, ApiError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_output_tokens,
            system: &payload.system,
            messages: vec![Message {
                role: "user",
                content: &payload.user,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network {
                detail: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            // The error envelope's message is useful context for 400s; for
            // everything else the status alone classifies the failure.
            let detail = response
                .json::<ErrorEnvelope>()
                .await
                .map(|env| env.error.message)
                .unwrap_or_default();
            return Err(map_status(status, detail));
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| ApiError::Decoding {
                detail: e.to_string(),
            })?;

        let text = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let usage = TokenUsage {
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
        };
        debug!(
            "model '{}' replied: {} chars, {} in / {} out tokens",
            self.model,
            text.chars().count(),
            usage.input_tokens,
            usage.output_tokens
        );

        Ok(CompletionReply { text, usage })
    }
}

/// Map a non-2xx HTTP status to the error taxonomy.
pub fn map_status(status: u16, detail: String) -> ApiError {
    match status {
        401 => ApiError::InvalidKey,
        400 => ApiError::InvalidRequest { detail },
        402 => ApiError::InsufficientCredit,
        429 => ApiError::RateLimited,
        other => ApiError::ServerError { status: other },
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: UsageBody,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct UsageBody {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert!(matches!(map_status(401, String::new()), ApiError::InvalidKey));
        assert!(matches!(
            map_status(400, "bad field".into()),
            ApiError::InvalidRequest { .. }
        ));
        assert!(matches!(
            map_status(402, String::new()),
            ApiError::InsufficientCredit
        ));
        assert!(matches!(map_status(429, String::new()), ApiError::RateLimited));
        assert!(matches!(
            map_status(529, String::new()),
            ApiError::ServerError { status: 529 }
        ));
        assert!(matches!(
            map_status(404, String::new()),
            ApiError::ServerError { status: 404 }
        ));
    }

    #[test]
    fn mapped_server_errors_follow_retry_rule() {
        assert!(map_status(503, String::new()).is_retryable());
        assert!(map_status(429, String::new()).is_retryable());
        assert!(!map_status(404, String::new()).is_retryable());
        assert!(!map_status(401, String::new()).is_retryable());
    }

    #[test]
    fn response_body_decodes_content_blocks_and_usage() {
        let raw = r#"{
            "id": "msg_01",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "{\"cards\": []}"},
                {"type": "tool_use", "text": ""}
            ],
            "usage": {"input_tokens": 812, "output_tokens": 96}
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text: Vec<&str> = parsed
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(text, vec!["{\"cards\": []}"]);
        assert_eq!(parsed.usage.input_tokens, 812);
        assert_eq!(parsed.usage.output_tokens, 96);
    }

    #[test]
    fn error_envelope_decodes() {
        let raw = r#"{"type": "error", "error": {"type": "invalid_request_error", "message": "max_tokens required"}}"#;
        let env: ErrorEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(env.error.message, "max_tokens required");
    }

    #[test]
    fn request_body_serialises_expected_shape() {
        let body = MessagesRequest {
            model: "claude-3-5-haiku-latest",
            max_tokens: 4096,
            system: "rules",
            messages: vec![Message {
                role: "user",
                content: "document",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-3-5-haiku-latest");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "document");
    }
}
