use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MIN_STYLE_LEVEL: u8 = 1;
pub const MAX_STYLE_LEVEL: u8 = 5;

fn default_style() -> String {
    "Professional".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandGuidelines {
    pub name: String,
    #[serde(default)]
    pub voice: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub fonts: Vec<String>,
    #[serde(default = "default_style")]
    pub style: String,
}

impl BrandGuidelines {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Brand name is required"));
        }
        if self.colors.iter().all(|color| color.trim().is_empty()) {
            return Err(anyhow::anyhow!("At least one brand color is required"));
        }
        if self.fonts.iter().all(|font| font.trim().is_empty()) {
            return Err(anyhow::anyhow!("At least one brand font is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleAdjustments {
    pub tone: u8,
    pub creativity: u8,
    pub emotion: u8,
}

impl Default for StyleAdjustments {
    fn default() -> Self {
        StyleAdjustments {
            tone: 3,
            creativity: 3,
            emotion: 3,
        }
    }
}

fn clamp_level(level: u8) -> u8 {
    level.clamp(MIN_STYLE_LEVEL, MAX_STYLE_LEVEL)
}

fn describe(level: u8, low: &'static str, high: &'static str) -> &'static str {
    if level < 3 {
        low
    } else {
        high
    }
}

impl StyleAdjustments {
    pub fn new(tone: u8, creativity: u8, emotion: u8) -> Self {
        StyleAdjustments {
            tone: clamp_level(tone),
            creativity: clamp_level(creativity),
            emotion: clamp_level(emotion),
        }
    }

    pub fn entries(&self) -> [(&'static str, u8, &'static str); 3] {
        [
            ("tone", self.tone, describe(self.tone, "formal", "casual")),
            (
                "creativity",
                self.creativity,
                describe(self.creativity, "conservative", "creative"),
            ),
            (
                "emotion",
                self.emotion,
                describe(self.emotion, "rational", "emotional"),
            ),
        ]
    }

    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, level, description) in self.entries() {
            map.insert(
                name.to_string(),
                json!({ "level": level, "description": description }),
            );
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guidelines() -> BrandGuidelines {
        BrandGuidelines {
            name: "Acme".to_string(),
            voice: "Professional and innovative".to_string(),
            target_audience: "Business professionals".to_string(),
            colors: vec!["#1a237e".to_string()],
            fonts: vec!["Roboto".to_string()],
            style: "Professional".to_string(),
        }
    }

    #[test]
    fn complete_guidelines_pass_validation() {
        assert!(guidelines().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut invalid = guidelines();
        invalid.name = "  ".to_string();
        let err = invalid.validate().unwrap_err();
        assert_eq!(err.to_string(), "Brand name is required");
    }

    #[test]
    fn missing_colors_are_rejected() {
        let mut invalid = guidelines();
        invalid.colors.clear();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn style_defaults_to_professional_when_absent() {
        let parsed: BrandGuidelines = serde_json::from_str(
            r##"{"name":"Acme","voice":"Casual and friendly","target_audience":"Students","colors":["#fff"],"fonts":["Lato"]}"##,
        )
        .unwrap();
        assert_eq!(parsed.style, "Professional");
    }

    #[test]
    fn levels_are_clamped_into_range() {
        let adjustments = StyleAdjustments::new(0, 9, 3);
        assert_eq!(adjustments.tone, 1);
        assert_eq!(adjustments.creativity, 5);
        assert_eq!(adjustments.emotion, 3);
    }

    #[test]
    fn low_levels_take_the_low_descriptor() {
        let adjustments = StyleAdjustments::new(1, 2, 2);
        let entries = adjustments.entries();
        assert_eq!(entries[0].2, "formal");
        assert_eq!(entries[1].2, "conservative");
        assert_eq!(entries[2].2, "rational");
    }

    #[test]
    fn midpoint_levels_take_the_high_descriptor() {
        let entries = StyleAdjustments::default().entries();
        assert_eq!(entries[0].2, "casual");
        assert_eq!(entries[1].2, "creative");
        assert_eq!(entries[2].2, "emotional");
    }

    #[test]
    fn to_value_nests_level_and_description() {
        let value = StyleAdjustments::new(2, 4, 5).to_value();
        assert_eq!(value["tone"]["level"], 2);
        assert_eq!(value["tone"]["description"], "formal");
        assert_eq!(value["creativity"]["description"], "creative");
        assert_eq!(value["emotion"]["level"], 5);
    }
}
