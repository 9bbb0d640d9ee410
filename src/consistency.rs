use anyhow::Result;
use serde_json::Value;

use crate::brand::BrandGuidelines;
use crate::config::Config;
use crate::llm::parse::{extract_reply_json, ReplyJson};
use crate::llm::{GeminiClient, LanguageModel};
use crate::prompts;

pub const DEFAULT_CONSISTENCY_SCORE: f64 = 0.5;

pub struct ConsistencyChecker<M = GeminiClient> {
    model: M,
}

impl ConsistencyChecker {
    pub fn new(config: &Config) -> Self {
        ConsistencyChecker {
            model: GeminiClient::new(config),
        }
    }
}

impl<M: LanguageModel> ConsistencyChecker<M> {
    #[cfg(test)]
    pub fn with_model(model: M) -> Self {
        ConsistencyChecker { model }
    }

    // Averages the per-aspect scores from the reply. A reply that does not
    // parse to an all-numeric object scores 0.5 rather than failing.
    pub async fn check_consistency(
        &self,
        ad_text: &Value,
        guidelines: &BrandGuidelines,
    ) -> Result<f64> {
        let prompt = prompts::consistency_scores(ad_text, guidelines);
        let reply = self.model.generate_text(&prompt).await?;
        Ok(score_from_reply(&reply))
    }

    pub async fn improvement_suggestions(
        &self,
        ad_text: &Value,
        guidelines: &BrandGuidelines,
    ) -> Result<String> {
        let prompt = prompts::improvement_suggestions(ad_text, guidelines);
        self.model.generate_text(&prompt).await
    }
}

fn score_from_reply(reply: &str) -> f64 {
    let ReplyJson::Structured(scores) = extract_reply_json(reply) else {
        return DEFAULT_CONSISTENCY_SCORE;
    };
    if scores.is_empty() {
        return DEFAULT_CONSISTENCY_SCORE;
    }

    let mut total = 0.0;
    for value in scores.values() {
        match value.as_f64() {
            Some(number) => total += number,
            None => return DEFAULT_CONSISTENCY_SCORE,
        }
    }
    total / scores.len() as f64
}
