use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::LanguageModel;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_host: String,
    api_key: String,
    model: String,
    temperature: f32,
    top_k: i32,
    top_p: f32,
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

// Non-text parts deserialize with `text: None` and are skipped.
#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Option<Vec<ModelInfo>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn summarize_payload(payload: &Value) -> String {
    let mut summary = payload.clone();
    if let Some(parts) = summary
        .pointer_mut("/contents/0/parts")
        .and_then(Value::as_array_mut)
    {
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                *part = json!({ "text": truncate_for_log(text, 200) });
            } else if let Some(inline) = part.get("inlineData") {
                let mime_type = inline
                    .get("mimeType")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let data_len = inline
                    .get("data")
                    .and_then(Value::as_str)
                    .map_or(0, str::len);
                *part = json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } });
            }
        }
    }
    summary.to_string()
}

fn extract_text_from_response(response: GeminiResponse) -> String {
    let mut segments = Vec::new();
    for candidate in response.candidates.unwrap_or_default() {
        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default();
        for part in parts {
            if let Some(text) = part.text {
                if !text.trim().is_empty() {
                    segments.push(text);
                }
            }
        }
    }
    segments.join("\n")
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_host: config.gemini_api_host.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            temperature: config.gemini_temperature,
            top_k: config.gemini_top_k,
            top_p: config.gemini_top_p,
            max_output_tokens: config.gemini_max_output_tokens,
        }
    }

    fn redact_api_key(&self, text: &str) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return text.to_string();
        }
        text.replace(key, "[redacted]")
    }

    fn build_payload(&self, parts: Vec<Value>) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": self.temperature,
                "topK": self.top_k,
                "topP": self.top_p,
                "maxOutputTokens": self.max_output_tokens,
            },
        })
    }

    async fn call_api(&self, payload: Value) -> Result<GeminiResponse> {
        let client = get_http_client();
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_host, self.model, self.api_key
        );

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(target: "llm.gemini", model = %self.model, payload = %summarize_payload(&payload));
        }

        let response = match client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(err) => {
                let err_text = self.redact_api_key(&err.to_string());
                warn!(
                    "Gemini request failed to send: {} (timeout={}, connect={})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect()
                );
                return Err(anyhow!("Gemini request failed: {}", err_text));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Gemini API error: status={}, body={}", status, body_summary);
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "Gemini request failed with status {}: {}",
                status,
                detail
            ));
        }

        let value = response.json::<GeminiResponse>().await?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let candidates = value.candidates.as_ref().map_or(0, Vec::len);
            debug!(target: "llm.gemini", model = %self.model, candidates = candidates);
        }
        Ok(value)
    }

    async fn generate(&self, operation: &str, parts: Vec<Value>) -> Result<String> {
        let payload = self.build_payload(parts);
        let response = log_llm_timing("gemini", &self.model, operation, None, || async {
            self.call_api(payload).await
        })
        .await?;
        let text = extract_text_from_response(response);
        if text.trim().is_empty() {
            return Err(anyhow!("Gemini response contained no text"));
        }
        Ok(text)
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let client = get_http_client();
        let url = format!("{}/v1beta/models?key={}", self.api_host, self.api_key);

        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                let err_text = self.redact_api_key(&err.to_string());
                warn!("Gemini model listing failed to send: {}", err_text);
                return Err(anyhow!("Gemini request failed: {}", err_text));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!(
                "Gemini model listing error: status={}, body={}",
                status, body_summary
            );
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "Gemini model listing failed with status {}: {}",
                status,
                detail
            ));
        }

        let listing = response.json::<ModelsResponse>().await?;
        Ok(listing.models.unwrap_or_default())
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.generate("generate_text", vec![json!({ "text": prompt })])
            .await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String> {
        let encoded = general_purpose::STANDARD.encode(image);
        let parts = vec![
            json!({ "text": prompt }),
            json!({ "inlineData": { "mimeType": mime_type, "data": encoded } }),
        ];
        self.generate("generate_with_image", parts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        GeminiClient {
            api_host: "https://example.invalid".to_string(),
            api_key: "secret-key".to_string(),
            model: "gemini-1.5-pro".to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }

    #[test]
    fn extract_text_joins_parts_with_newlines() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "First line" },
                        { "text": "Second line" }
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(
            extract_text_from_response(response),
            "First line\nSecond line"
        );
    }

    #[test]
    fn extract_text_skips_non_text_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                        { "text": "caption" }
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(extract_text_from_response(response), "caption");
    }

    #[test]
    fn extract_text_handles_missing_candidates() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text_from_response(response), "");
    }

    #[test]
    fn summarize_error_body_pulls_nested_message() {
        let body = r#"{"error": {"code": 400, "message": "API key expired. Please renew the API key.", "status": "INVALID_ARGUMENT"}}"#;
        let (message, detail) = summarize_error_body(body);
        assert_eq!(
            message.as_deref(),
            Some("API key expired. Please renew the API key.")
        );
        assert!(detail.contains("INVALID_ARGUMENT"));
    }

    #[test]
    fn summarize_error_body_falls_back_to_raw_text() {
        let (message, detail) = summarize_error_body("upstream exploded");
        assert!(message.is_none());
        assert_eq!(detail, "upstream exploded");
    }

    #[test]
    fn summarize_error_body_reports_empty_bodies() {
        let (message, detail) = summarize_error_body("   ");
        assert!(message.is_none());
        assert_eq!(detail, "empty response body");
    }

    #[test]
    fn truncate_for_log_leaves_short_values_alone() {
        assert_eq!(truncate_for_log("short", 10), "short");
    }

    #[test]
    fn truncate_for_log_truncates_long_values() {
        let long = "x".repeat(50);
        let truncated = truncate_for_log(&long, 10);
        assert_eq!(truncated, format!("{}... (truncated)", "x".repeat(10)));
    }

    #[test]
    fn redact_api_key_replaces_key_in_text() {
        let client = test_client();
        let redacted = client.redact_api_key("error at ?key=secret-key for url");
        assert!(!redacted.contains("secret-key"));
        assert!(redacted.contains("[redacted]"));
    }

    #[test]
    fn summarize_payload_truncates_text_and_elides_image_data() {
        let client = test_client();
        let long_prompt = "p".repeat(400);
        let parts = vec![
            json!({ "text": long_prompt }),
            json!({ "inlineData": { "mimeType": "image/png", "data": "A".repeat(1000) } }),
        ];
        let summary = summarize_payload(&client.build_payload(parts));
        assert!(summary.contains("... (truncated)"));
        assert!(summary.contains("\"dataLen\":1000"));
        assert!(!summary.contains(&"A".repeat(1000)));
    }

    #[test]
    fn payload_carries_generation_config() {
        let client = test_client();
        let payload = client.build_payload(vec![json!({ "text": "hi" })]);
        assert_eq!(payload["generationConfig"]["topK"], 40);
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(payload["contents"][0]["role"], "user");
    }

    #[test]
    fn model_info_accepts_camel_case_fields() {
        let info: ModelInfo = serde_json::from_value(json!({
            "name": "models/gemini-1.5-pro",
            "displayName": "Gemini 1.5 Pro",
            "description": "Mid-size multimodal model"
        }))
        .unwrap();
        assert_eq!(info.name, "models/gemini-1.5-pro");
        assert_eq!(info.display_name.as_deref(), Some("Gemini 1.5 Pro"));
    }
}
