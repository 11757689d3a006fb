//! Scripted provider doubles for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::services::image::ImageGenerator;
use crate::services::llm::TextGenerator;
use crate::services::speech::SpeechSynthesizer;

/// A model reply that passes validation for the given chapter.
pub fn valid_reply(chapter_number: u32) -> String {
    let first = chapter_number == 1;
    json!({
        "content": "The lighthouse keeper vanished at midnight.",
        "optionA": "Climb the tower",
        "optionB": "Search the beach",
        "image": if first { "a lighthouse at dusk" } else { "" },
        "title": if first { "The Last Light" } else { "" }
    })
    .to_string()
}

pub fn rate_limited(provider: &'static str) -> ProviderError {
    ProviderError::from_status(provider, 429, "Too Many Requests")
}

pub fn transient(provider: &'static str) -> ProviderError {
    ProviderError::new(provider, ProviderErrorKind::Transient, "connection reset")
}

/// Text provider that plays back a script, one entry per call. Once the
/// script runs out it keeps returning `repeat`, or a fatal error if unset.
pub struct ScriptedText {
    name: &'static str,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    repeat: Option<Result<String, ProviderError>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedText {
    pub fn new(name: &'static str, script: Vec<Result<String, ProviderError>>) -> Self {
        ScriptedText {
            name,
            script: Mutex::new(script.into()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(name: &'static str, reply: Result<String, ProviderError>) -> Self {
        ScriptedText {
            repeat: Some(reply),
            ..ScriptedText::new(name, Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        next.or_else(|| self.repeat.clone()).unwrap_or_else(|| {
            Err(ProviderError::new(
                self.name,
                ProviderErrorKind::Fatal,
                "script exhausted",
            ))
        })
    }
}

pub struct RecordingSpeech {
    audio: Option<Vec<u8>>,
    texts: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    pub fn returning(audio: Vec<u8>) -> Self {
        RecordingSpeech {
            audio: Some(audio),
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        RecordingSpeech {
            audio: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        self.texts.lock().unwrap().push(text.to_string());
        self.audio.clone().ok_or_else(|| {
            ProviderError::from_status("speech", 500, "speech service unavailable")
        })
    }
}

pub struct RecordingImages {
    urls: Option<Vec<String>>,
    requests: Mutex<Vec<(String, String, u8)>>,
}

impl RecordingImages {
    pub fn returning(urls: Vec<String>) -> Self {
        RecordingImages {
            urls: Some(urls),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        RecordingImages {
            urls: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(String, String, u8)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for RecordingImages {
    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        count: u8,
    ) -> Result<Vec<String>, ProviderError> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), size.to_string(), count));
        self.urls.clone().ok_or_else(|| {
            ProviderError::from_status("image", 400, "content policy violation")
        })
    }
}
