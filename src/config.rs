use std::env;
use std::path::PathBuf;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub gemini_api_key: String,
    pub gemini_api_host: String,
    pub gemini_model: String,
    pub gemini_temperature: f32,
    pub gemini_top_k: i32,
    pub gemini_top_p: f32,
    pub gemini_max_output_tokens: i32,
    pub stability_api_key: String,
    pub stability_api_host: String,
    pub stability_engine: String,
    pub images_dir: PathBuf,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn load() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("GEMINI_API_KEY is required"));
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            gemini_api_key,
            gemini_api_host: env_string(
                "GEMINI_API_HOST",
                "https://generativelanguage.googleapis.com",
            ),
            gemini_model: env_string("GEMINI_MODEL", "gemini-1.5-pro"),
            gemini_temperature: env_f32("GEMINI_TEMPERATURE", 0.7),
            gemini_top_k: env_i32("GEMINI_TOP_K", 40),
            gemini_top_p: env_f32("GEMINI_TOP_P", 0.95),
            gemini_max_output_tokens: env_i32("GEMINI_MAX_OUTPUT_TOKENS", 2048),
            stability_api_key: env_string("STABILITY_API_KEY", ""),
            stability_api_host: env_string("STABILITY_API_HOST", "https://api.stability.ai"),
            stability_engine: env_string("STABILITY_ENGINE", "stable-diffusion-xl-1024-v1-0"),
            images_dir: PathBuf::from(env_string("GENERATED_IMAGES_DIR", "generated_images")),
        })
    }

    pub fn has_stability_credentials(&self) -> bool {
        !self.stability_api_key.trim().is_empty()
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            log_level: "info".to_string(),
            gemini_api_key: "test-key".to_string(),
            gemini_api_host: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_temperature: 0.7,
            gemini_top_k: 40,
            gemini_top_p: 0.95,
            gemini_max_output_tokens: 2048,
            stability_api_key: String::new(),
            stability_api_host: "https://api.stability.ai".to_string(),
            stability_engine: "stable-diffusion-xl-1024-v1-0".to_string(),
            images_dir: PathBuf::from("generated_images"),
        }
    }
}
