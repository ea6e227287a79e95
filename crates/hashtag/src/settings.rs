use serde::{Deserialize, Serialize};
use vision_llm::{openai::DEFAULT_BASE_URL, ImageDetail, LLMInferenceParams};

/// The separator the prompt asks for and the parser splits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "camelCase")]
pub enum TagDelimiter {
    #[strum(serialize = "comma")]
    Comma,
    #[strum(serialize = "newline")]
    Newline,
}

impl TagDelimiter {
    pub fn as_char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Newline => '\n',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelStrategy {
    /// keyword matching against the category taxonomy, no network call
    Heuristic,
    /// a second completion call
    Model,
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: Option<f64>,
    pub image_detail: Option<ImageDetail>,
    pub delimiter: TagDelimiter,
    /// inclusive range of tags requested in the prompt
    pub requested_tags: (usize, usize),
    pub max_count: usize,
    pub max_tag_length: usize,
    pub max_image_bytes: u64,
    pub export_scale: f64,
    pub label_strategy: LabelStrategy,
}

impl PipelineSettings {
    /// Web page: comma separated words without `#`, at most 12 tags.
    pub fn web() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4.1".to_string(),
            max_tokens: 150,
            temperature: Some(0.3),
            image_detail: Some(ImageDetail::Low),
            delimiter: TagDelimiter::Comma,
            requested_tags: (8, 12),
            max_count: 12,
            max_tag_length: 24,
            max_image_bytes: 20 * 1024 * 1024,
            export_scale: 1.0,
            label_strategy: LabelStrategy::Heuristic,
        }
    }

    /// Design canvas: one `#tag` per line, at most 20 tags.
    pub fn canvas() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 500,
            temperature: None,
            image_detail: None,
            delimiter: TagDelimiter::Newline,
            requested_tags: (15, 25),
            max_count: 20,
            ..Self::web()
        }
    }

    pub fn inference_params(&self) -> LLMInferenceParams {
        LLMInferenceParams {
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::web()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: &str, style: &str) -> Self {
        Self {
            family: family.to_string(),
            style: style.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Layout constants for hashtags inserted into a design canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasStyle {
    pub container_name: String,
    pub template_name: String,
    pub margin_x: f64,
    pub gap_below_content: f64,
    pub base_height: f64,
    pub padding: f64,
    pub item_spacing: f64,
    pub corner_radius: f64,
    pub background: Rgb,
    pub font_size: f64,
    pub text_color: Rgb,
    pub primary_font: FontName,
    pub fallback_font: FontName,
}

impl Default for CanvasStyle {
    fn default() -> Self {
        Self {
            container_name: "Generated Hashtags".to_string(),
            template_name: "Hashtag Template".to_string(),
            margin_x: 20.0,
            gap_below_content: 50.0,
            base_height: 80.0,
            padding: 16.0,
            item_spacing: 8.0,
            corner_radius: 8.0,
            background: Rgb {
                r: 0.98,
                g: 0.98,
                b: 0.98,
            },
            font_size: 11.0,
            text_color: Rgb {
                r: 0.3,
                g: 0.4,
                b: 0.9,
            },
            primary_font: FontName::new("Inter", "Regular"),
            fallback_font: FontName::new("Arial", "Regular"),
        }
    }
}
