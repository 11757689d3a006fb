use async_trait::async_trait;
use serde_json::json;

use crate::config::OpenAiConfig;
use crate::error::{ProviderError, ProviderErrorKind};
use crate::services::transport;

/// Text-to-speech with a voice and model fixed at construction.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError>;
}

pub struct OpenAiSpeechClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    voice: String,
}

impl OpenAiSpeechClient {
    const NAME: &'static str = "openai-speech";

    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        OpenAiSpeechClient {
            client,
            api_url: format!("{}/audio/speech", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.speech_model.clone(),
            voice: config.voice.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let request = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "voice": self.voice,
                "input": text,
                "response_format": "mp3"
            }));

        let response = transport::send(Self::NAME, request).await?;
        let audio = response.bytes().await.map_err(|e| {
            ProviderError::new(
                Self::NAME,
                ProviderErrorKind::Transient,
                format!("audio stream interrupted: {e}"),
            )
        })?;

        Ok(audio.to_vec())
    }
}
