use serde::Serialize;
use serde_json::Value;

use crate::analyzer::ReferenceAnalysis;
use crate::brand::{BrandGuidelines, StyleAdjustments};
use crate::formats::AdFormatSpec;

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn compact<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn text_analysis(text: &str) -> String {
    format!(
        "Analyze this advertisement text and extract key elements:\n\
         {text}\n\n\
         Please provide:\n\
         1. Main message/theme\n\
         2. Tone of voice\n\
         3. Target audience\n\
         4. Key selling points\n\
         5. Call to action\n\
         6. Writing style\n\n\
         Format the response as valid JSON."
    )
}

pub fn image_analysis() -> &'static str {
    "Analyze this advertisement image and provide insights about:\n\
     1. Visual composition\n\
     2. Color scheme\n\
     3. Brand elements\n\
     4. Message clarity\n\
     5. Target audience appeal\n\
     6. Areas for improvement\n\n\
     Format the response as valid JSON."
}

pub fn brand_voice_guidance(
    guidelines: &BrandGuidelines,
    adjustments: &StyleAdjustments,
) -> String {
    let mut guidance = format!(
        "Brand Voice Characteristics:\n\
         - Primary Voice: {}\n\
         - Target Audience: {}\n",
        guidelines.voice, guidelines.target_audience
    );
    guidance.push_str("\nStyle Adjustments:\n");
    for (name, level, description) in adjustments.entries() {
        guidance.push_str(&format!("- {name}: level {level} ({description})\n"));
    }
    guidance
}

pub fn generation(
    reference: &ReferenceAnalysis,
    guidelines: &BrandGuidelines,
    format_name: &str,
    spec: &AdFormatSpec,
    brand_voice: &str,
    adjustments: &StyleAdjustments,
) -> String {
    let text_length = spec.text_length.as_deref().unwrap_or("Standard length");
    format!(
        "Create compelling ad copy following these specifications:\n\n\
         Reference Analysis:\n\
         {reference}\n\n\
         Brand Guidelines:\n\
         {guidelines}\n\n\
         Format Requirements:\n\
         - Type: {format_name}\n\
         - Text Length: {text_length}\n\
         - Required Components: {component_list}\n\n\
         Brand Voice:\n\
         {brand_voice}\n\n\
         Style Adjustments:\n\
         {adjustments}\n\n\
         Please generate ad copy in JSON format with the following components:\n\
         {components_json}\n\n\
         Each component should reflect the brand voice and style while maintaining the specified length constraints.",
        reference = pretty(reference),
        guidelines = pretty(guidelines),
        component_list = spec.components.join(", "),
        adjustments = pretty(&adjustments.to_value()),
        components_json = pretty(&spec.components),
    )
}

pub fn brand_elements(text_analysis: &Value, image_analysis: &Value) -> String {
    format!(
        "Based on the following analyses, extract comprehensive brand elements:\n\n\
         Text Analysis:\n\
         {text}\n\n\
         Image Analysis:\n\
         {image}\n\n\
         Please provide a JSON response with:\n\
         1. Overall brand personality\n\
         2. Key visual elements\n\
         3. Communication style\n\
         4. Target audience profile\n\
         5. Brand voice characteristics",
        text = pretty(text_analysis),
        image = pretty(image_analysis),
    )
}

fn guidelines_block(guidelines: &BrandGuidelines) -> String {
    format!(
        "Brand Guidelines:\n\
         - Brand Name: {name}\n\
         - Brand Voice: {voice}\n\
         - Target Audience: {audience}\n\
         - Brand Colors: {colors}\n\
         - Brand Fonts: {fonts}",
        name = guidelines.name,
        voice = guidelines.voice,
        audience = guidelines.target_audience,
        colors = guidelines.colors.join(", "),
        fonts = guidelines.fonts.join(", "),
    )
}

pub fn consistency_scores(ad_text: &Value, guidelines: &BrandGuidelines) -> String {
    format!(
        "Analyze the consistency between this generated ad and the brand guidelines:\n\n\
         Generated Ad:\n\
         {ad}\n\n\
         {guidelines}\n\n\
         Please evaluate the following aspects and provide a score between 0 and 1 for each:\n\
         1. Brand Voice Consistency\n\
         2. Target Audience Alignment\n\
         3. Message Clarity\n\
         4. Visual Style (if applicable)\n\
         5. Overall Brand Alignment\n\n\
         Return the scores in JSON format.",
        ad = compact(ad_text),
        guidelines = guidelines_block(guidelines),
    )
}

pub fn improvement_suggestions(ad_text: &Value, guidelines: &BrandGuidelines) -> String {
    format!(
        "Provide specific suggestions to improve the brand consistency of this ad:\n\n\
         Generated Ad:\n\
         {ad}\n\n\
         {guidelines}\n\n\
         Please provide:\n\
         1. Specific changes to align with brand voice\n\
         2. Suggestions for better target audience alignment\n\
         3. Ways to strengthen brand message\n\
         4. Visual improvements (if applicable)",
        ad = compact(ad_text),
        guidelines = guidelines_block(guidelines),
    )
}

pub fn image_generation(
    guidelines: &BrandGuidelines,
    format_name: &str,
    ad_text: &Value,
) -> String {
    format!(
        "Create a professional advertisement image with:\n\
         Style: {style}\n\
         Colors: {colors}\n\
         Format: {format_name}\n\
         Brand Elements: Professional, modern, clean design\n\
         Text Elements: {text}",
        style = guidelines.style,
        colors = guidelines.colors.join(", "),
        text = compact(ad_text),
    )
}
