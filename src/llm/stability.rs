use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::Config;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const CFG_SCALE: u32 = 7;
const STEPS: u32 = 30;
const SAMPLES: u32 = 1;

#[derive(Debug, Clone)]
pub struct StabilityClient {
    api_host: String,
    api_key: String,
    engine: String,
}

#[derive(Debug, Deserialize)]
struct StabilityResponse {
    artifacts: Option<Vec<StabilityArtifact>>,
}

#[derive(Debug, Deserialize)]
struct StabilityArtifact {
    base64: String,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

// Stability errors put the message at the top level rather than under "error".
fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .pointer("/error/message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn decode_first_artifact(response: StabilityResponse) -> Result<Vec<u8>> {
    let artifact = response
        .artifacts
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Stability response contained no artifacts"))?;
    general_purpose::STANDARD
        .decode(artifact.base64.as_bytes())
        .map_err(|err| anyhow!("Failed to decode Stability artifact: {}", err))
}

impl StabilityClient {
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.has_stability_credentials() {
            return None;
        }
        Some(Self {
            api_host: config.stability_api_host.clone(),
            api_key: config.stability_api_key.trim().to_string(),
            engine: config.stability_engine.clone(),
        })
    }

    fn build_payload(&self, prompt: &str, width: u32, height: u32) -> Value {
        json!({
            "text_prompts": [{ "text": prompt }],
            "cfg_scale": CFG_SCALE,
            "height": height,
            "width": width,
            "samples": SAMPLES,
            "steps": STEPS,
        })
    }

    async fn call_api(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        let client = get_http_client();
        let url = format!(
            "{}/v1/generation/{}/text-to-image",
            self.api_host, self.engine
        );
        let payload = self.build_payload(prompt, width, height);

        let response = match client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "Stability request failed to send: {} (timeout={}, connect={})",
                    err,
                    err.is_timeout(),
                    err.is_connect()
                );
                return Err(anyhow!("Stability request failed: {}", err));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!(
                "Stability API error: status={}, body={}",
                status, body_summary
            );
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "Stability request failed with status {}: {}",
                status,
                detail
            ));
        }

        let value = response.json::<StabilityResponse>().await?;
        decode_first_artifact(value)
    }

    pub async fn text_to_image(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        let metadata = json!({ "width": width, "height": height });
        log_llm_timing(
            "stability",
            &self.engine,
            "text_to_image",
            Some(metadata),
            || async { self.call_api(prompt, width, height).await },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> Config {
        Config {
            stability_api_key: key.to_string(),
            ..Config::for_tests()
        }
    }

    #[test]
    fn from_config_requires_an_api_key() {
        assert!(StabilityClient::from_config(&config_with_key("")).is_none());
        assert!(StabilityClient::from_config(&config_with_key("   ")).is_none());
        assert!(StabilityClient::from_config(&config_with_key("sk-test")).is_some());
    }

    #[test]
    fn payload_uses_fixed_diffusion_settings() {
        let client = StabilityClient::from_config(&config_with_key("sk-test")).unwrap();
        let payload = client.build_payload("a red banner", 1536, 640);
        assert_eq!(payload["text_prompts"][0]["text"], "a red banner");
        assert_eq!(payload["cfg_scale"], 7);
        assert_eq!(payload["steps"], 30);
        assert_eq!(payload["samples"], 1);
        assert_eq!(payload["width"], 1536);
        assert_eq!(payload["height"], 640);
    }

    #[test]
    fn decode_first_artifact_returns_image_bytes() {
        let response: StabilityResponse = serde_json::from_value(json!({
            "artifacts": [{ "base64": "aGVsbG8=", "finishReason": "SUCCESS", "seed": 42 }]
        }))
        .unwrap();
        assert_eq!(decode_first_artifact(response).unwrap(), b"hello");
    }

    #[test]
    fn decode_first_artifact_rejects_empty_responses() {
        let response: StabilityResponse = serde_json::from_value(json!({})).unwrap();
        let err = decode_first_artifact(response).unwrap_err();
        assert!(err.to_string().contains("no artifacts"));
    }

    #[test]
    fn summarize_error_body_prefers_top_level_message() {
        let body = r#"{"id": "abc", "name": "invalid_height_or_width", "message": "height must be a multiple of 64"}"#;
        let (message, _) = summarize_error_body(body);
        assert_eq!(message.as_deref(), Some("height must be a multiple of 64"));
    }
}
