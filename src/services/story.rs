use std::sync::Arc;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::StoryError;
use crate::models::{ChapterRequest, ChapterResult};
use crate::services::composer::MediaComposer;
use crate::services::generation::Orchestrator;
use crate::services::image::{ImageGenerator, OpenAiImageClient};
use crate::services::llm::{OpenAiChatClient, TextGenerator, VertexGeminiClient};
use crate::services::localization;
use crate::services::prompt::{PromptContext, build_prompt};
use crate::services::speech::{OpenAiSpeechClient, SpeechSynthesizer};
use crate::services::transport;

/// Every external service a chapter needs.
pub struct Providers {
    pub primary: Arc<dyn TextGenerator>,
    pub fallback: Option<Arc<dyn TextGenerator>>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub images: Arc<dyn ImageGenerator>,
    pub image_size: String,
    pub max_attempts: u32,
}

impl Providers {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = transport::http_client(config.provider_timeout)?;

        let fallback: Option<Arc<dyn TextGenerator>> = if config.fallback_enabled {
            Some(Arc::new(OpenAiChatClient::new(client.clone(), &config.openai)))
        } else {
            None
        };

        Ok(Providers {
            primary: Arc::new(VertexGeminiClient::new(client.clone(), &config.gemini)),
            fallback,
            speech: Arc::new(OpenAiSpeechClient::new(client.clone(), &config.openai)),
            images: Arc::new(OpenAiImageClient::new(client, &config.openai)),
            image_size: config.openai.image_size.clone(),
            max_attempts: config.max_attempts,
        })
    }
}

/// Produces one chapter: prompt, validated draft, then narration and cover.
#[instrument(skip_all, fields(chapter = request.chapter_number()))]
pub async fn process_request(
    request: &ChapterRequest,
    providers: &Providers,
) -> Result<ChapterResult, StoryError> {
    let chapter_number = request.chapter_number();
    let language = request.language();
    if !localization::is_supported(language) {
        warn!(language, "narration phrases not translated, falling back to English");
    }

    // Step 1: build the instruction for the text model
    let prompt = build_prompt(&PromptContext {
        chapter_number,
        previous_chapters: &request.previous_chapters,
        previous_option: request.previous_option.as_deref(),
        language,
        genre: request.genre.as_deref(),
    });

    // Step 2: get a usable draft
    let orchestrator = Orchestrator::new(
        providers.primary.as_ref(),
        providers.fallback.as_deref(),
        providers.max_attempts,
    );
    let accepted = orchestrator.generate(&prompt, chapter_number).await?;
    info!(
        attempt = accepted.attempt.number,
        source = %accepted.attempt.source,
        "draft ready, composing media"
    );

    // Step 3: narration and cover
    let composer = MediaComposer::new(
        providers.speech.as_ref(),
        providers.images.as_ref(),
        &providers.image_size,
    );
    composer.compose(accepted.draft, chapter_number, language).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaStage;
    use crate::test_support::{
        RecordingImages, RecordingSpeech, ScriptedText, rate_limited, valid_reply,
    };
    use serde_json::json;

    struct Harness {
        primary: Arc<ScriptedText>,
        fallback: Arc<ScriptedText>,
        speech: Arc<RecordingSpeech>,
        images: Arc<RecordingImages>,
    }

    impl Harness {
        fn new(primary: ScriptedText, fallback: ScriptedText, speech: RecordingSpeech) -> Self {
            Harness {
                primary: Arc::new(primary),
                fallback: Arc::new(fallback),
                speech: Arc::new(speech),
                images: Arc::new(RecordingImages::returning(vec![
                    "https://img.example/cover.png".into(),
                ])),
            }
        }

        fn providers(&self) -> Providers {
            Providers {
                primary: self.primary.clone(),
                fallback: Some(self.fallback.clone()),
                speech: self.speech.clone(),
                images: self.images.clone(),
                image_size: "256x256".into(),
                max_attempts: 5,
            }
        }
    }

    #[tokio::test]
    async fn first_chapter_end_to_end() {
        let harness = Harness::new(
            ScriptedText::new("primary", vec![Ok(valid_reply(1))]),
            ScriptedText::new("fallback", vec![]),
            RecordingSpeech::returning(vec![1, 2]),
        );
        let request: ChapterRequest =
            serde_json::from_value(json!({ "genre": "mystery" })).unwrap();

        let result = process_request(&request, &harness.providers()).await.unwrap();

        assert_eq!(result.image, "https://img.example/cover.png");
        assert_eq!(result.title, "The Last Light");
        assert_eq!(harness.images.calls(), 1);
        assert_eq!(harness.speech.calls(), 1);
        assert!(harness.primary.prompts()[0].contains("Chapter 1 of the story only"));
        assert!(harness.primary.prompts()[0].contains("genre is mystery"));
    }

    #[tokio::test]
    async fn later_chapter_uses_history_and_language() {
        let harness = Harness::new(
            ScriptedText::new("primary", vec![Err(rate_limited("primary"))]),
            ScriptedText::new("fallback", vec![Ok(valid_reply(2))]),
            RecordingSpeech::returning(vec![1]),
        );
        let request: ChapterRequest = serde_json::from_value(json!({
            "previousChapters": [{ "content": "It began." }],
            "previousOption": "Climb the tower",
            "language": "Spanish"
        }))
        .unwrap();

        let result = process_request(&request, &harness.providers()).await.unwrap();

        assert_eq!(result.image, "");
        assert_eq!(harness.images.calls(), 0);
        assert_eq!(harness.fallback.calls(), 1);
        assert!(harness.fallback.prompts()[0].contains("Chosen option: Climb the tower"));
        assert!(harness.speech.texts()[0].starts_with("Capítulo 2."));
    }

    #[tokio::test]
    async fn media_failure_after_valid_draft_is_not_retried() {
        let harness = Harness::new(
            ScriptedText::repeating("primary", Ok(valid_reply(2))),
            ScriptedText::new("fallback", vec![]),
            RecordingSpeech::failing(),
        );
        let request: ChapterRequest =
            serde_json::from_value(json!({ "previousChapters": [{}] })).unwrap();

        let err = process_request(&request, &harness.providers()).await.unwrap_err();

        assert!(matches!(
            err,
            StoryError::MediaComposition {
                stage: MediaStage::Audio,
                ..
            }
        ));
        assert_eq!(harness.primary.calls(), 1);
        assert_eq!(harness.speech.calls(), 1);
    }
}
