use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::analyzer::ReferenceAnalysis;
use crate::brand::{BrandGuidelines, StyleAdjustments};
use crate::config::Config;
use crate::dimensions::{nearest_allowed, parse_size_string};
use crate::formats::{format_spec, output_image_name, AdFormatSpec};
use crate::llm::parse::{extract_reply_json, ReplyJson};
use crate::llm::{GeminiClient, LanguageModel, StabilityClient};
use crate::placeholder::generate_placeholder;
use crate::prompts;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AdCopy {
    Components(Map<String, Value>),
    Raw {
        #[serde(rename = "raw_text")]
        text: String,
        error: String,
    },
}

impl From<ReplyJson> for AdCopy {
    fn from(reply: ReplyJson) -> Self {
        match reply {
            ReplyJson::Structured(map) => AdCopy::Components(map),
            ReplyJson::Degraded { raw, error } => AdCopy::Raw {
                text: raw,
                error: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedAd {
    pub text: AdCopy,
    pub image: Option<PathBuf>,
    pub format: String,
    pub specs: AdFormatSpec,
}

pub struct AdGenerator<M = GeminiClient> {
    model: M,
    stability: Option<StabilityClient>,
    images_dir: PathBuf,
}

impl AdGenerator {
    pub fn new(config: &Config) -> Self {
        AdGenerator {
            model: GeminiClient::new(config),
            stability: StabilityClient::from_config(config),
            images_dir: config.images_dir.clone(),
        }
    }
}

impl<M: LanguageModel> AdGenerator<M> {
    #[cfg(test)]
    pub fn with_parts(model: M, stability: Option<StabilityClient>, images_dir: PathBuf) -> Self {
        AdGenerator {
            model,
            stability,
            images_dir,
        }
    }

    // Variations are generated sequentially; a failed model call drops that
    // variation and the loop moves on, so the result can hold fewer ads than
    // requested. A reply that is not valid JSON still becomes an ad, with the
    // raw text carried through.
    pub async fn generate(
        &self,
        reference: &ReferenceAnalysis,
        guidelines: &BrandGuidelines,
        format_name: &str,
        num_variations: u32,
        adjustments: &StyleAdjustments,
    ) -> Vec<GeneratedAd> {
        let spec = format_spec(format_name);
        let mut ads = Vec::new();

        for variation in 1..=num_variations {
            let copy = match self
                .generate_copy(reference, guidelines, format_name, &spec, adjustments)
                .await
            {
                Ok(copy) => copy,
                Err(err) => {
                    error!("Error generating ad variation {}: {:#}", variation, err);
                    continue;
                }
            };

            let image = if spec.image_size.is_some() {
                self.generate_image(guidelines, format_name, &spec, &copy)
                    .await
            } else {
                None
            };

            ads.push(GeneratedAd {
                text: copy,
                image,
                format: format_name.to_string(),
                specs: spec.clone(),
            });
        }

        ads
    }

    async fn generate_copy(
        &self,
        reference: &ReferenceAnalysis,
        guidelines: &BrandGuidelines,
        format_name: &str,
        spec: &AdFormatSpec,
        adjustments: &StyleAdjustments,
    ) -> Result<AdCopy> {
        let brand_voice = prompts::brand_voice_guidance(guidelines, adjustments);
        let prompt = prompts::generation(
            reference,
            guidelines,
            format_name,
            spec,
            &brand_voice,
            adjustments,
        );
        let reply = self.model.generate_text(&prompt).await?;
        Ok(extract_reply_json(&reply).into())
    }

    async fn generate_image(
        &self,
        guidelines: &BrandGuidelines,
        format_name: &str,
        spec: &AdFormatSpec,
        copy: &AdCopy,
    ) -> Option<PathBuf> {
        let Some(stability) = &self.stability else {
            warn!("STABILITY_API_KEY not set; using placeholder image");
            return generate_placeholder(&self.images_dir, format_name);
        };

        let size = spec.image_size.as_deref().unwrap_or("1024x1024");
        let (target_width, target_height) = parse_size_string(size);
        let (width, height) = nearest_allowed(target_width, target_height);
        info!("Using dimensions {width}x{height} (closest to requested {target_width}x{target_height})");

        let copy_value = serde_json::to_value(copy).unwrap_or_default();
        let prompt = prompts::image_generation(guidelines, format_name, &copy_value);

        match stability.text_to_image(&prompt, width, height).await {
            Ok(bytes) => match self.save_image(format_name, &bytes) {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!("Error saving generated image: {:#}", err);
                    generate_placeholder(&self.images_dir, format_name)
                }
            },
            Err(err) => {
                warn!("Error generating image: {:#}", err);
                generate_placeholder(&self.images_dir, format_name)
            }
        }
    }

    fn save_image(&self, format_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.images_dir).map_err(|err| {
            anyhow!(
                "Failed to create image directory {}: {}",
                self.images_dir.display(),
                err
            )
        })?;
        let path = self.images_dir.join(output_image_name(format_name));
        std::fs::write(&path, bytes)
            .map_err(|err| anyhow!("Failed to write image {}: {}", path.display(), err))?;
        Ok(path)
    }
}
