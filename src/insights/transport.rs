//! HTTP calls to the supported LLM providers.
//!
//! Every provider returns the model's raw text; parsing and schema checks
//! happen in the requester.

use std::time::Duration;

use tracing::{debug, error};

use super::prompts::{gemini_response_schema, insights_envelope_schema, JSON_ONLY_SYSTEM_PROMPT};
use super::types::InsightError;
use crate::config::AiProvider;

/// One completion call: which provider, which model, what to ask.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub provider: AiProvider,
    pub model: &'a str,
    pub api_key: &'a str,
    pub prompt: &'a str,
}

/// Sends a prompt to a reasoning service and returns the reply text.
#[allow(async_fn_in_trait)]
pub trait CompletionTransport {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, InsightError>;
}

/// reqwest-based transport for Gemini, Claude, OpenAI and OpenRouter.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Result<Self, InsightError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InsightError::Client(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn send_error(&self, provider: AiProvider, e: reqwest::Error) -> InsightError {
        let err = if e.is_timeout() {
            InsightError::Timeout {
                provider: provider.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            InsightError::Request {
                provider: provider.to_string(),
                message: e.to_string(),
            }
        };
        error!("{}", err);
        err
    }

    /// Gemini generateContent with a native response schema.
    async fn call_gemini(&self, request: &CompletionRequest<'_>) -> Result<String, InsightError> {
        let body = serde_json::json!({
            "contents": [
                {"role": "user", "parts": [{"text": request.prompt}]}
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": gemini_response_schema()
            }
        });

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            request.model
        );
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", request.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(request.provider, e))?;

        let body_text = handle_api_response(response, request.provider).await?;

        // { "candidates": [{"content": {"parts": [{"text": "..."}]}}] }
        let resp_json = parse_wrapper(&body_text, "Gemini")?;
        extract_text(
            &resp_json["candidates"][0]["content"]["parts"][0]["text"],
            "Gemini",
        )
    }

    /// Anthropic messages API; JSON is enforced through the system prompt.
    async fn call_claude(&self, request: &CompletionRequest<'_>) -> Result<String, InsightError> {
        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": 2048,
            "system": JSON_ONLY_SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": request.prompt}
            ]
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", request.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(request.provider, e))?;

        let body_text = handle_api_response(response, request.provider).await?;

        // { "content": [{"type": "text", "text": "..."}] }
        let resp_json = parse_wrapper(&body_text, "Claude")?;
        extract_text(&resp_json["content"][0]["text"], "Claude")
    }

    /// OpenAI chat completions with strict json_schema output.
    async fn call_openai(&self, request: &CompletionRequest<'_>) -> Result<String, InsightError> {
        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": 2048,
            "messages": [
                {"role": "user", "content": request.prompt}
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "equipment_insights",
                    "strict": true,
                    "schema": insights_envelope_schema()
                }
            }
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", request.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(request.provider, e))?;

        let body_text = handle_api_response(response, request.provider).await?;

        // { "choices": [{"message": {"content": "..."}}] }
        let resp_json = parse_wrapper(&body_text, "OpenAI")?;
        extract_text(&resp_json["choices"][0]["message"]["content"], "OpenAI")
    }

    /// OpenRouter chat completions. Routed models vary in structured output
    /// support, so JSON is requested through the system prompt.
    async fn call_openrouter(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<String, InsightError> {
        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": 2048,
            "messages": [
                {"role": "system", "content": JSON_ONLY_SYSTEM_PROMPT},
                {"role": "user", "content": request.prompt}
            ]
        });

        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", request.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(request.provider, e))?;

        let body_text = handle_api_response(response, request.provider).await?;

        // Same wrapper as OpenAI
        let resp_json = parse_wrapper(&body_text, "OpenRouter")?;
        extract_text(&resp_json["choices"][0]["message"]["content"], "OpenRouter")
    }
}

impl CompletionTransport for HttpTransport {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, InsightError> {
        debug!(
            "Sending {}-char prompt to {} model '{}'",
            request.prompt.len(),
            request.provider,
            request.model
        );
        match request.provider {
            AiProvider::Gemini => self.call_gemini(request).await,
            AiProvider::Claude => self.call_claude(request).await,
            AiProvider::OpenAi => self.call_openai(request).await,
            AiProvider::OpenRouter => self.call_openrouter(request).await,
        }
    }
}

/// Check status and extract the body text.
async fn handle_api_response(
    response: reqwest::Response,
    provider: AiProvider,
) -> Result<String, InsightError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        let err = InsightError::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: truncate(&body, 1024),
        };
        error!("{}", err);
        return Err(err);
    }
    response.text().await.map_err(|e| InsightError::Request {
        provider: provider.to_string(),
        message: format!("Failed to read API response body: {}", e),
    })
}

fn parse_wrapper(body_text: &str, label: &str) -> Result<serde_json::Value, InsightError> {
    serde_json::from_str(body_text).map_err(|e| {
        InsightError::MalformedResponse(format!(
            "Failed to parse {} API response wrapper: {}",
            label, e
        ))
    })
}

fn extract_text(value: &serde_json::Value, label: &str) -> Result<String, InsightError> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| InsightError::MalformedResponse(format!("No text content in {} API response", label)))
}

/// Cut `text` to at most `max` bytes on a char boundary, marking the cut.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
