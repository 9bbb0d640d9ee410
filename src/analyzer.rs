use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::Config;
use crate::llm::media::detect_mime_type;
use crate::llm::parse::extract_reply_json;
use crate::llm::{GeminiClient, LanguageModel};
use crate::prompts;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<Value>,
}

impl ReferenceAnalysis {
    pub fn is_empty(&self) -> bool {
        self.text_analysis.is_none() && self.image_analysis.is_none()
    }
}

pub struct ReferenceAnalyzer<M = GeminiClient> {
    model: M,
}

impl ReferenceAnalyzer {
    pub fn new(config: &Config) -> Self {
        ReferenceAnalyzer {
            model: GeminiClient::new(config),
        }
    }
}

impl<M: LanguageModel> ReferenceAnalyzer<M> {
    #[cfg(test)]
    pub fn with_model(model: M) -> Self {
        ReferenceAnalyzer { model }
    }

    pub async fn analyze_text(&self, text: &str) -> Result<Value> {
        let reply = self
            .model
            .generate_text(&prompts::text_analysis(text))
            .await?;
        Ok(extract_reply_json(&reply).to_value("analysis"))
    }

    // Unlike text analysis, image analysis never fails the run; any error is
    // folded into the returned value.
    pub async fn analyze_image(&self, path: &Path) -> Value {
        match self.try_analyze_image(path).await {
            Ok(value) => value,
            Err(err) => {
                warn!("Image analysis failed for {}: {:#}", path.display(), err);
                json!({ "error": format!("Error analyzing image: {err:#}") })
            }
        }
    }

    async fn try_analyze_image(&self, path: &Path) -> Result<Value> {
        let bytes = std::fs::read(path)
            .map_err(|err| anyhow!("Failed to read image {}: {}", path.display(), err))?;
        let mime_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
        let reply = self
            .model
            .generate_with_image(prompts::image_analysis(), &bytes, &mime_type)
            .await?;
        Ok(extract_reply_json(&reply).to_value("analysis"))
    }

    pub async fn extract_brand_elements(
        &self,
        text_analysis: &Value,
        image_analysis: &Value,
    ) -> Result<Value> {
        let prompt = prompts::brand_elements(text_analysis, image_analysis);
        let reply = self.model.generate_text(&prompt).await?;
        Ok(extract_reply_json(&reply).to_value("analysis"))
    }
}
