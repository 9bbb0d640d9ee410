pub mod gemini;
pub mod media;
pub mod parse;
pub mod stability;

use anyhow::Result;
use async_trait::async_trait;

pub use gemini::GeminiClient;
pub use stability::StabilityClient;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;
    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String>;
}
