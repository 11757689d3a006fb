use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::{GeminiConfig, OpenAiConfig};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::services::transport;

/// A model that turns a prompt into raw text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub struct VertexGeminiClient {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
}

impl VertexGeminiClient {
    const NAME: &'static str = "vertex-gemini";

    pub fn new(client: reqwest::Client, config: &GeminiConfig) -> Self {
        let api_url = format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent",
            location = config.location,
            project = config.project_id,
            model = config.model,
        );

        VertexGeminiClient {
            client,
            api_url,
            access_token: config.access_token.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiPart {
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[async_trait]
impl TextGenerator for VertexGeminiClient {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
            }));

        let response = transport::send(Self::NAME, request).await?;
        let body: GeminiResponse = transport::read_json(Self::NAME, response).await?;

        // Blocked or empty candidates are worth another try.
        body.first_text().ok_or_else(|| {
            ProviderError::new(
                Self::NAME,
                ProviderErrorKind::Transient,
                "response contained no candidate text",
            )
        })
    }
}

pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    const NAME: &'static str = "openai-chat";

    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        OpenAiChatClient {
            client,
            api_url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiChatClient {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "response_format": { "type": "json_object" }
            }));

        let response = transport::send(Self::NAME, request).await?;
        let body: ChatResponse = transport::read_json(Self::NAME, response).await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::new(
                    Self::NAME,
                    ProviderErrorKind::Transient,
                    "response contained no message content",
                )
            })
    }
}
