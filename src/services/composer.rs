use tracing::{error, info, instrument};

use crate::error::{MediaStage, ProviderError, ProviderErrorKind, StoryError};
use crate::models::{AudioClip, ChapterDraft, ChapterResult};
use crate::services::image::ImageGenerator;
use crate::services::localization::{Phrase, lookup};
use crate::services::repair::image_required;
use crate::services::speech::SpeechSynthesizer;

/// Adds narration, and a cover for the opening chapter, to an accepted draft.
pub struct MediaComposer<'a> {
    speech: &'a dyn SpeechSynthesizer,
    images: &'a dyn ImageGenerator,
    image_size: &'a str,
}

impl<'a> MediaComposer<'a> {
    pub fn new(
        speech: &'a dyn SpeechSynthesizer,
        images: &'a dyn ImageGenerator,
        image_size: &'a str,
    ) -> Self {
        MediaComposer {
            speech,
            images,
            image_size,
        }
    }

    #[instrument(skip(self, draft), fields(chapter = chapter_number))]
    pub async fn compose(
        &self,
        mut draft: ChapterDraft,
        chapter_number: u32,
        language: &str,
    ) -> Result<ChapterResult, StoryError> {
        let text = narration(&draft, chapter_number, language);

        // Audio and cover only depend on the draft, so they run side by side.
        let audio = async {
            info!("generating audio");
            self.speech
                .synthesize(&text)
                .await
                .map_err(|source| media_failure(MediaStage::Audio, source))
        };
        let cover = async {
            if !image_required(chapter_number) {
                return Ok(None);
            }
            info!("generating image");
            self.cover(&draft.image).await.map(Some)
        };

        let (audio, cover) = tokio::try_join!(audio, cover)?;
        if let Some(url) = cover {
            draft.image = url;
        }

        info!(audio_bytes = audio.len(), "chapter complete");
        Ok(ChapterResult::from_draft(draft, AudioClip(audio)))
    }

    async fn cover(&self, prompt: &str) -> Result<String, StoryError> {
        let urls = self
            .images
            .generate_image(prompt, self.image_size, 1)
            .await
            .map_err(|source| media_failure(MediaStage::Image, source))?;

        urls.into_iter().next().ok_or_else(|| {
            media_failure(
                MediaStage::Image,
                ProviderError::new(
                    "image",
                    ProviderErrorKind::Fatal,
                    "image provider returned no URL",
                ),
            )
        })
    }
}

fn media_failure(stage: MediaStage, source: ProviderError) -> StoryError {
    error!(%stage, error = %source, "media composition failed");
    StoryError::MediaComposition { stage, source }
}

/// The text read aloud for a chapter: title (first chapter only), chapter
/// heading, narrative, then the choice as a question.
pub fn narration(draft: &ChapterDraft, chapter_number: u32, language: &str) -> String {
    let mut sentences = Vec::new();

    if chapter_number == 1 && !draft.title.trim().is_empty() {
        sentences.push(sentence(&draft.title));
    }
    sentences.push(sentence(&format!(
        "{} {chapter_number}",
        lookup(Phrase::Chapter, language)
    )));
    sentences.push(sentence(&draft.content));
    sentences.push(format!(
        "{}: {}, {}: {}?",
        lookup(Phrase::OptionA, language),
        draft.option_a.trim(),
        lookup(Phrase::OptionB, language),
        draft.option_b.trim(),
    ));

    sentences.join(" ")
}

fn sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?', '…']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}
