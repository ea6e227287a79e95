mod error;
pub mod openai;

pub use error::{CompletionError, CompletionResult};
pub use openai::OpenAI;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    High,
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

#[derive(Debug, Clone)]
pub enum LLMUserMessage {
    Text(String),
    ImageUrl(ImageUrl),
}

#[derive(Debug, Clone)]
pub enum LLMMessage {
    System(String),
    User(Vec<LLMUserMessage>),
    Assistant(String),
}

impl LLMMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::User(vec![LLMUserMessage::Text(text.into())])
    }

    /// A user turn with the instruction first and the image second.
    pub fn user_with_image(text: impl Into<String>, image: ImageUrl) -> Self {
        Self::User(vec![
            LLMUserMessage::Text(text.into()),
            LLMUserMessage::ImageUrl(image),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LLMInferenceParams {
    pub max_tokens: Option<usize>,
    pub temperature: Option<f64>,
}

impl Default for LLMInferenceParams {
    fn default() -> Self {
        Self {
            max_tokens: Some(512),
            temperature: None,
        }
    }
}

/// A chat completion backend that understands image content parts.
#[async_trait]
pub trait VisionChat: Send + Sync {
    async fn get_completion(
        &self,
        history: &[LLMMessage],
        params: &LLMInferenceParams,
    ) -> CompletionResult<String>;

    fn model_name(&self) -> &str;
}
