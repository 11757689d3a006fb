use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::services::generation::DEFAULT_MAX_ATTEMPTS;

const DEV_SECRETS_PATH: &str = "./secrets.json";
const DEPLOYED_SECRETS_PATH: &str = "/etc/secrets/infinite-story-secrets.json";

const DEFAULT_ORIGINS: &[&str] = &[
    "https://the-infinite-story.netlify.app",
    "http://localhost:4200",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
    pub fallback_enabled: bool,
    pub max_attempts: u32,
    pub provider_timeout: Duration,
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    pub model: String,
    pub access_token: String,
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub speech_model: String,
    pub voice: String,
    pub image_model: String,
    pub image_size: String,
}

// Credentials stay out of debug output.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("speech_model", &self.speech_model)
            .field("voice", &self.voice)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .finish_non_exhaustive()
    }
}

/// Optional JSON file holding provider credentials. Environment variables take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Secrets {
    gcp_access_token: Option<String>,
    open_ai_key: Option<String>,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        if is_dev(env("APP_ENV").or_else(|| env("NODE_ENV")).as_deref()) {
            // a missing .env is fine, the variables may already be exported
            let _ = dotenvy::dotenv();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let dev = is_dev(var("APP_ENV").or_else(|| var("NODE_ENV")).as_deref());
        let secrets_path = var("SECRETS_PATH").map(PathBuf::from).unwrap_or_else(|| {
            PathBuf::from(if dev {
                DEV_SECRETS_PATH
            } else {
                DEPLOYED_SECRETS_PATH
            })
        });
        let secrets = load_secrets(&secrets_path)?;

        let port = match var("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {port:?}"))?,
            None => 3001,
        };

        let max_attempts: u32 =
            parse_or(var("MAX_ATTEMPTS"), DEFAULT_MAX_ATTEMPTS, "MAX_ATTEMPTS")?;
        if max_attempts == 0 {
            bail!("MAX_ATTEMPTS must be at least 1");
        }
        let timeout_secs: u64 =
            parse_or(var("PROVIDER_TIMEOUT_SECS"), 120, "PROVIDER_TIMEOUT_SECS")?;

        let allowed_origins = match var("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let project_id = var("GCP_PROJECT_ID").context("GCP_PROJECT_ID must be set")?;
        let access_token = var("GCP_ACCESS_TOKEN")
            .or(secrets.gcp_access_token)
            .with_context(|| {
                format!(
                    "GCP_ACCESS_TOKEN must be set or provided in {}",
                    secrets_path.display()
                )
            })?;
        let openai_key = var("OPEN_AI_KEY").or(secrets.open_ai_key).with_context(|| {
            format!(
                "OPEN_AI_KEY must be set or provided in {}",
                secrets_path.display()
            )
        })?;

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            allowed_origins,
            gemini: GeminiConfig {
                project_id,
                location: var("GCP_LOCATION").unwrap_or_else(|| "us-central1".to_string()),
                model: var("TEXT_MODEL").unwrap_or_else(|| "gemini-1.0-pro".to_string()),
                access_token,
            },
            openai: OpenAiConfig {
                api_key: openai_key,
                base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                chat_model: var("FALLBACK_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                speech_model: "tts-1".to_string(),
                voice: "onyx".to_string(),
                image_model: "dall-e-2".to_string(),
                image_size: "256x256".to_string(),
            },
            fallback_enabled: parse_or(var("FALLBACK_ENABLED"), true, "FALLBACK_ENABLED")?,
            max_attempts,
            provider_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn is_dev(value: Option<&str>) -> bool {
    matches!(
        value,
        Some(v) if v.eq_ignore_ascii_case("dev") || v.eq_ignore_ascii_case("development")
    )
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T, key: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse().with_context(|| format!("invalid {key}: {v:?}")),
        None => Ok(default),
    }
}

fn load_secrets(path: &Path) -> Result<Secrets> {
    if !path.exists() {
        return Ok(Secrets::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read secrets file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("secrets file {} is not valid JSON", path.display()))
}
