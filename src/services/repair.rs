//! Turns a model reply into JSON, tolerating the usual ways models get JSON wrong:
//! code fences, prose around the object, trailing commas, bare keys.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::error::DraftError;
use crate::models::ChapterDraft;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairError {
    #[error("no JSON object found in model reply")]
    NoStructuredContentFound,

    #[error("JSON still invalid after repair: {reason}")]
    Unparseable { reason: String, cleaned: String },
}

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```(?:json)?").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());
static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([{,]\s*)['"]?([A-Za-z0-9_]+)['"]?\s*:"#).unwrap());
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\r|\n|\t").unwrap());

pub fn parse_model_reply(raw: &str) -> Result<Value, RepairError> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Ok(value);
    }

    let candidate = extract_object(raw)?;
    let cleaned = clean(candidate);

    serde_json::from_str(&cleaned).map_err(|e| RepairError::Unparseable {
        reason: e.to_string(),
        cleaned,
    })
}

/// Parses a reply and checks it is usable as a chapter at this position.
pub fn parse_draft(raw: &str, chapter_number: u32) -> Result<ChapterDraft, DraftError> {
    let value = parse_model_reply(raw)?;
    let draft: ChapterDraft = serde_json::from_value(value)
        .map_err(|e| DraftError::IncompleteDraft(format!("unexpected shape: {e}")))?;
    validate(&draft, chapter_number)?;
    Ok(draft)
}

pub fn validate(draft: &ChapterDraft, chapter_number: u32) -> Result<(), DraftError> {
    if draft.content.trim().is_empty() {
        return Err(DraftError::IncompleteDraft("missing content".into()));
    }
    if image_required(chapter_number) && draft.image.trim().is_empty() {
        return Err(DraftError::IncompleteDraft(
            "first chapter is missing an image prompt".into(),
        ));
    }
    Ok(())
}

pub fn image_required(chapter_number: u32) -> bool {
    chapter_number == 1
}

fn extract_object(raw: &str) -> Result<&str, RepairError> {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
        _ => Err(RepairError::NoStructuredContentFound),
    }
}

fn clean(candidate: &str) -> String {
    let text = CODE_FENCE.replace_all(candidate, "");
    let text = TRAILING_COMMA.replace_all(&text, "$1");
    let text = BARE_KEY.replace_all(&text, "$1\"$2\":");
    let text = text.replace("\\'", "'");
    let text = LINE_BREAK.replace_all(&text, "");
    text.trim().to_string()
}
