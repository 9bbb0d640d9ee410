use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdFormatSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

impl AdFormatSpec {
    fn new(text_length: &str, image_size: &str, components: &[&str]) -> Self {
        AdFormatSpec {
            text_length: Some(text_length.to_string()),
            image_size: Some(image_size.to_string()),
            components: components.iter().map(|c| c.to_string()).collect(),
        }
    }
}

static AD_FORMATS: Lazy<Vec<(&'static str, AdFormatSpec)>> = Lazy::new(|| {
    vec![
        (
            "Social Media Post",
            AdFormatSpec::new(
                "Short and punchy, max 280 characters",
                "1200x630 pixels",
                &["headline", "main_text", "cta"],
            ),
        ),
        (
            "Banner Ad",
            AdFormatSpec::new(
                "Very concise, max 50 characters",
                "728x90 pixels",
                &["headline", "cta"],
            ),
        ),
        (
            "Email Marketing",
            AdFormatSpec::new(
                "Detailed but scannable, max 500 characters",
                "600x300 pixels",
                &["subject_line", "headline", "main_text", "cta"],
            ),
        ),
        (
            "Print Ad",
            AdFormatSpec::new(
                "Balanced copy, max 200 characters",
                "8.5x11 inches",
                &["headline", "subheadline", "main_text", "cta"],
            ),
        ),
    ]
});

pub fn format_names() -> Vec<&'static str> {
    AD_FORMATS.iter().map(|(name, _)| *name).collect()
}

pub fn format_spec(name: &str) -> AdFormatSpec {
    AD_FORMATS
        .iter()
        .find(|(format_name, _)| *format_name == name)
        .map(|(_, spec)| spec.clone())
        .unwrap_or_default()
}

// Shared by real renders and placeholders so both land in the same place.
// Second-resolution timestamps mean two saves of the same format within one
// second reuse the file name.
pub fn output_image_name(format_name: &str) -> String {
    format!(
        "ad_{}_{}.png",
        format_name.to_lowercase().replace(' ', "_"),
        Utc::now().timestamp()
    )
}
