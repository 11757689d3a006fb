use tracing::{debug, error, info, instrument, warn};

use crate::error::{DraftError, ProviderError, ProviderErrorKind, StoryError};
use crate::models::{AcceptedDraft, ChapterDraft, GenerationAttempt, ProviderSource};
use crate::services::llm::TextGenerator;
use crate::services::repair::{self, RepairError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Asks the text providers for a chapter until one answer holds up.
///
/// Each attempt calls the primary provider once. A rate-limited primary hands
/// that attempt to the fallback provider, once; if the fallback fails too the
/// attempt is spent and the loop moves on. Transient provider errors and
/// unusable replies also spend the attempt. Fatal provider errors end the run.
pub struct Orchestrator<'a> {
    primary: &'a dyn TextGenerator,
    fallback: Option<&'a dyn TextGenerator>,
    max_attempts: u32,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        primary: &'a dyn TextGenerator,
        fallback: Option<&'a dyn TextGenerator>,
        max_attempts: u32,
    ) -> Self {
        Orchestrator {
            primary,
            fallback,
            max_attempts: max_attempts.max(1),
        }
    }

    #[instrument(skip_all, fields(chapter = chapter_number, primary = self.primary.name()))]
    pub async fn generate(
        &self,
        prompt: &str,
        chapter_number: u32,
    ) -> Result<AcceptedDraft, StoryError> {
        for number in 1..=self.max_attempts {
            info!(attempt = number, "requesting chapter text");

            match self.primary.generate(prompt).await {
                Ok(raw) => match repair::parse_draft(&raw, chapter_number) {
                    Ok(draft) => return Ok(accept(draft, number, ProviderSource::Primary)),
                    Err(err) => report_unusable(number, self.primary.name(), &err),
                },
                Err(err) => match err.kind {
                    ProviderErrorKind::RateLimited => {
                        warn!(attempt = number, error = %err, "primary provider rate limited");
                        if let Some(draft) =
                            self.try_fallback(prompt, chapter_number, number).await
                        {
                            return Ok(accept(draft, number, ProviderSource::Fallback));
                        }
                    }
                    ProviderErrorKind::Transient => {
                        warn!(attempt = number, error = %err, "primary provider failed, retrying");
                    }
                    ProviderErrorKind::Fatal => {
                        error!(attempt = number, error = %err, "primary provider failed");
                        return Err(StoryError::Provider(err));
                    }
                },
            }
        }

        error!(attempts = self.max_attempts, "no valid chapter produced");
        Err(StoryError::RetriesExhausted {
            attempts: self.max_attempts,
        })
    }

    async fn try_fallback(
        &self,
        prompt: &str,
        chapter_number: u32,
        attempt: u32,
    ) -> Option<ChapterDraft> {
        let Some(fallback) = self.fallback else {
            debug!(attempt, "no fallback provider configured");
            return None;
        };

        info!(attempt, fallback = fallback.name(), "switching to fallback provider");
        match fallback.generate(prompt).await {
            Ok(raw) => match repair::parse_draft(&raw, chapter_number) {
                Ok(draft) => Some(draft),
                Err(err) => {
                    report_unusable(attempt, fallback.name(), &err);
                    None
                }
            },
            Err(err) => {
                report_fallback_failure(attempt, &err);
                None
            }
        }
    }
}

fn accept(draft: ChapterDraft, number: u32, source: ProviderSource) -> AcceptedDraft {
    info!(attempt = number, %source, "chapter draft accepted");
    AcceptedDraft {
        draft,
        attempt: GenerationAttempt { number, source },
    }
}

fn report_unusable(attempt: u32, provider: &str, err: &DraftError) {
    warn!(attempt, provider, error = %err, "unusable chapter draft");
    if let DraftError::MalformedModelOutput(RepairError::Unparseable { cleaned, .. }) = err {
        debug!(attempt, provider, cleaned = %cleaned, "repaired reply that still failed to parse");
    }
}

fn report_fallback_failure(attempt: u32, err: &ProviderError) {
    warn!(attempt, error = %err, "fallback provider failed, attempt spent");
}
