use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::OpenAiConfig;
use crate::error::ProviderError;
use crate::services::transport;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns one URL per generated image.
    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        count: u8,
    ) -> Result<Vec<String>, ProviderError>;
}

pub struct OpenAiImageClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiImageClient {
    const NAME: &'static str = "openai-image";

    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        OpenAiImageClient {
            client,
            api_url: format!("{}/images/generations", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.image_model.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageData {
    url: Option<String>,
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        count: u8,
    ) -> Result<Vec<String>, ProviderError> {
        let request = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "n": count,
                "size": size
            }));

        let response = transport::send(Self::NAME, request).await?;
        let body: ImagesResponse = transport::read_json(Self::NAME, response).await?;

        Ok(body.data.into_iter().filter_map(|image| image.url).collect())
    }
}
