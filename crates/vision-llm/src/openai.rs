use crate::{
    CompletionError, CompletionResult, LLMInferenceParams, LLMMessage, LLMUserMessage, VisionChat,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Url,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

pub struct OpenAI {
    base_url: String,
    model: String,
    headers: HeaderMap,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseChoice {
    message: Option<OpenAIResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIResponseChoice>,
}

impl OpenAI {
    /// Create a new OpenAI compatible chat completion client.
    /// The api key only lives in the request headers of this client.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> CompletionResult<Self> {
        let mut url =
            Url::parse(base_url).map_err(|e| CompletionError::InvalidEndpoint(e.to_string()))?;
        if !url.path().ends_with("/") {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        let base_url = url.to_string();

        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| CompletionError::InvalidCredential)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            base_url,
            model: model.to_string(),
            headers,
            client: reqwest::Client::new(),
        })
    }

    fn completion_url(&self) -> CompletionResult<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| CompletionError::InvalidEndpoint(e.to_string()))?;
        let query = url.query().map(|v| v.to_string());
        let mut url = url
            .join("chat/completions")
            .map_err(|e| CompletionError::InvalidEndpoint(e.to_string()))?;
        url.set_query(query.as_deref());
        Ok(url)
    }

    pub(crate) fn request_body(
        &self,
        history: &[LLMMessage],
        params: &LLMInferenceParams,
    ) -> Value {
        let messages = history.iter().map(message_to_json).collect::<Vec<Value>>();

        let mut body = json!({
            "model": &self.model,
            "messages": messages,
        });
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = params.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

fn message_to_json(message: &LLMMessage) -> Value {
    let (role, content) = match message {
        LLMMessage::System(v) => ("system", json!(v)),
        LLMMessage::User(v) => (
            "user",
            match v.as_slice() {
                [LLMUserMessage::Text(text)] => json!(text),
                parts => Value::Array(
                    parts
                        .iter()
                        .map(|t| match t {
                            LLMUserMessage::ImageUrl(image_url) => {
                                json!({"type": "image_url", "image_url": image_url})
                            }
                            LLMUserMessage::Text(text) => {
                                json!({"type": "text", "text": text})
                            }
                        })
                        .collect(),
                ),
            },
        ),
        LLMMessage::Assistant(v) => ("assistant", json!(v)),
    };

    json!({
        "role": role,
        "content": content,
    })
}

#[async_trait]
impl VisionChat for OpenAI {
    #[tracing::instrument(name = "OpenAI::get_completion", skip_all, err(Debug), fields(model = %self.model))]
    async fn get_completion(
        &self,
        history: &[LLMMessage],
        params: &LLMInferenceParams,
    ) -> CompletionResult<String> {
        let url = self.completion_url()?;
        tracing::debug!("openai url: {}", url);

        let body = self.request_body(history, params);
        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("openai response status: {}", status);
        let text = response.text().await?;

        if !status.is_success() {
            return Err(CompletionError::from_status(status.as_u16(), text));
        }

        let response: OpenAIResponse = serde_json::from_str(&text)?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyCompletion)?;

        if let Some(finish_reason) = &choice.finish_reason {
            tracing::debug!("LLM finish reason: {:?}", finish_reason);
        }

        choice
            .message
            .and_then(|v| v.content)
            .map(|content| content.trim().to_string())
            .ok_or(CompletionError::EmptyCompletion)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
