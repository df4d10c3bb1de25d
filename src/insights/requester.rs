use tracing::{error, info, warn};

use super::prompts::build_insight_prompt;
use super::transport::{truncate, CompletionRequest, CompletionTransport};
use super::types::{Insight, InsightError};
use crate::config::AiProvider;
use crate::equipment::EquipmentRecord;

/// Insights kept from one response.
pub const MAX_INSIGHTS: usize = 5;

/// Anything that can turn a record set into insights, or say why it could not.
#[allow(async_fn_in_trait)]
pub trait InsightProvider {
    async fn request(&self, records: &[EquipmentRecord]) -> Result<Vec<Insight>, InsightError>;
}

/// Prompts an LLM through a transport and validates what comes back.
pub struct InsightRequester<T: CompletionTransport> {
    transport: T,
    provider: AiProvider,
    model: String,
    api_key: Option<String>,
}

impl<T: CompletionTransport> InsightRequester<T> {
    /// `api_key: None` is a valid configuration: every request fails with
    /// `MissingCredential` before reaching the transport.
    pub fn new(
        transport: T,
        provider: AiProvider,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            provider,
            model: model.into(),
            api_key,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: CompletionTransport> InsightProvider for InsightRequester<T> {
    async fn request(&self, records: &[EquipmentRecord]) -> Result<Vec<Insight>, InsightError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| InsightError::MissingCredential(self.provider.to_string()))?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_insight_prompt(records);
        info!(
            "Requesting insights for {} records from '{}' model '{}'",
            records.len(),
            self.provider,
            self.model
        );

        let text = self
            .transport
            .complete(&CompletionRequest {
                provider: self.provider,
                model: &self.model,
                api_key,
                prompt: &prompt,
            })
            .await?;

        parse_insights(&text)
    }
}

/// Ask `provider` for insights, mapping every failure to an empty list.
///
/// Empty input short-circuits without calling the provider. Failures are
/// logged at error level so operators can tell "unreachable" apart from
/// "nothing to say".
pub async fn request_insights<P: InsightProvider>(
    provider: &P,
    records: &[EquipmentRecord],
) -> Vec<Insight> {
    if records.is_empty() {
        warn!("No equipment data provided for analysis");
        return Vec::new();
    }

    match provider.request(records).await {
        Ok(insights) => {
            info!("Received {} insights", insights.len());
            insights
        }
        Err(InsightError::MissingCredential(name)) => {
            error!(
                "No API key configured for '{}'; insights are unavailable. Set one with `equipscope key set {}`",
                name, name
            );
            Vec::new()
        }
        Err(e) => {
            error!("Error fetching insights: {}", e);
            Vec::new()
        }
    }
}

/// Validate a model reply as a list of insights.
///
/// Accepts a JSON array, or an object with an `insights` array, optionally
/// wrapped in a markdown code fence. One malformed item rejects the batch.
pub fn parse_insights(text: &str) -> Result<Vec<Insight>, InsightError> {
    let cleaned = strip_markdown_json(text);
    let value: serde_json::Value = serde_json::from_str(&cleaned).map_err(|e| {
        InsightError::MalformedResponse(format!(
            "Failed to parse LLM response as JSON: {}. Raw response (first 500 chars): {}",
            e,
            truncate(&cleaned, 500)
        ))
    })?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("insights") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(InsightError::Schema(
                    "expected an array or an object with an 'insights' array".to_string(),
                ))
            }
        },
        other => {
            return Err(InsightError::Schema(format!(
                "expected an array, got {}",
                json_kind(&other)
            )))
        }
    };

    let total = items.len();
    let mut insights = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<Insight>(item)
                .map_err(|e| InsightError::Schema(format!("item {}: {}", i, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if total > MAX_INSIGHTS {
        warn!("Model returned {} insights, keeping the first {}", total, MAX_INSIGHTS);
        insights.truncate(MAX_INSIGHTS);
    }
    Ok(insights)
}

/// Strip markdown code fences from an LLM reply if present.
fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    // Drop the opening fence and its optional language tag
    let after_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    let cleaned = after_open.trim_end();
    cleaned
        .strip_suffix("```")
        .unwrap_or(cleaned)
        .trim()
        .to_string()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::equipment::sample::sample_records;
    use crate::insights::types::RiskLevel;

    const VALID_REPLY: &str = r#"[
        {"title": "Reactor hot spot", "observation": "R101 runs at 220 C.",
         "recommendation": "Verify jacket cooling.", "riskLevel": "High"},
        {"title": "Idle valves", "observation": "Two valves show zero flow.",
         "recommendation": "Confirm valve positions.", "riskLevel": "Low"},
        {"title": "Pump pressure", "observation": "Pump X at 35 bar.",
         "recommendation": "Check seal rating.", "riskLevel": "Medium"}
    ]"#;

    /// Counts calls and replies with a canned result.
    struct MockTransport {
        calls: AtomicUsize,
        reply: Result<String, String>,
        last_prompt: Mutex<Option<String>>,
    }

    impl MockTransport {
        fn replying(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Ok(text.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Err(message.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CompletionTransport for MockTransport {
        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, InsightError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(request.prompt.to_string());
            self.reply.clone().map_err(|message| InsightError::Request {
                provider: request.provider.to_string(),
                message,
            })
        }
    }

    fn requester(transport: MockTransport, key: Option<&str>) -> InsightRequester<MockTransport> {
        InsightRequester::new(
            transport,
            AiProvider::Gemini,
            "gemini-1.5-flash",
            key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_no_credential_skips_transport() {
        let requester = requester(MockTransport::replying(VALID_REPLY), None);
        let insights = request_insights(&requester, &sample_records()).await;
        assert!(insights.is_empty());
        assert_eq!(requester.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_records_skip_transport() {
        let requester = requester(MockTransport::replying(VALID_REPLY), Some("key"));
        let insights = request_insights(&requester, &[]).await;
        assert!(insights.is_empty());
        assert_eq!(requester.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_reported_by_provider() {
        let requester = requester(MockTransport::replying(VALID_REPLY), None);
        let result = requester.request(&sample_records()).await;
        assert!(matches!(result, Err(InsightError::MissingCredential(ref p)) if p == "gemini"));
    }

    #[tokio::test]
    async fn test_valid_reply_yields_insights() {
        let requester = requester(MockTransport::replying(VALID_REPLY), Some("key"));
        let insights = request_insights(&requester, &sample_records()).await;

        assert_eq!(requester.transport().calls(), 1);
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].title, "Reactor hot spot");
        assert_eq!(insights[0].risk_level, RiskLevel::High);
        assert_eq!(insights[1].risk_level, RiskLevel::Low);
        assert_eq!(insights[2].risk_level, RiskLevel::Medium);

        let prompt = requester.transport().last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("React Vessel R101 (Reactor)"));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_empty() {
        let requester = requester(MockTransport::failing("connection refused"), Some("key"));
        let insights = request_insights(&requester, &sample_records()).await;
        assert!(insights.is_empty());
        assert_eq!(requester.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_degrades_to_empty() {
        let requester = requester(MockTransport::replying("Sorry, I cannot help."), Some("key"));
        assert!(request_insights(&requester, &sample_records()).await.is_empty());

        let result = requester.request(&sample_records()).await;
        assert!(matches!(result, Err(InsightError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_schema_violation_degrades_to_empty() {
        let reply = r#"[{"title": "t", "observation": "o", "recommendation": "r", "riskLevel": "Severe"}]"#;
        let requester = requester(MockTransport::replying(reply), Some("key"));
        assert!(request_insights(&requester, &sample_records()).await.is_empty());
    }

    #[test]
    fn test_parse_insights_array() {
        let insights = parse_insights(VALID_REPLY).unwrap();
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn test_parse_insights_envelope() {
        let reply = r#"{"insights": [{"title": "t", "observation": "o", "recommendation": "r", "riskLevel": "Low"}]}"#;
        let insights = parse_insights(reply).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_parse_insights_code_fence() {
        let reply = format!("```json\n{}\n```", VALID_REPLY);
        assert_eq!(parse_insights(&reply).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_insights_empty_array() {
        assert!(parse_insights("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_insights_missing_field_rejects_batch() {
        let reply = r#"[
            {"title": "ok", "observation": "o", "recommendation": "r", "riskLevel": "Low"},
            {"title": "bad", "observation": "o", "riskLevel": "Low"}
        ]"#;
        let err = parse_insights(reply).unwrap_err();
        assert!(matches!(err, InsightError::Schema(_)));
        assert!(err.to_string().contains("item 1"));
    }

    #[test]
    fn test_parse_insights_wrong_shape() {
        assert!(matches!(parse_insights("42"), Err(InsightError::Schema(_))));
        assert!(matches!(
            parse_insights(r#"{"results": []}"#),
            Err(InsightError::Schema(_))
        ));
        assert!(matches!(
            parse_insights("[1, 2]"),
            Err(InsightError::Schema(_))
        ));
    }

    #[test]
    fn test_parse_insights_caps_count() {
        let item = r#"{"title": "t", "observation": "o", "recommendation": "r", "riskLevel": "Low"}"#;
        let reply = format!("[{}]", vec![item; 8].join(","));
        assert_eq!(parse_insights(&reply).unwrap().len(), MAX_INSIGHTS);
    }

    #[test]
    fn test_strip_markdown_json() {
        assert_eq!(strip_markdown_json("  [1]  "), "[1]");
        assert_eq!(strip_markdown_json("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_markdown_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_markdown_json("```[1]```"), "[1]");
    }
}
