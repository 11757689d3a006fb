use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_LANGUAGE: &str = "English";

/// An earlier chapter as the caller sent it. Only ever echoed back into the prompt.
pub type PriorChapter = serde_json::Value;

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub previous_chapters: Vec<PriorChapter>,
    #[serde(default)]
    pub previous_option: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl ChapterRequest {
    /// Position of the chapter this request asks for.
    pub fn chapter_number(&self) -> u32 {
        u32::try_from(self.previous_chapters.len()).map_or(u32::MAX, |n| n.saturating_add(1))
    }

    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// A chapter as proposed by the text model, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterDraft {
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub option_a: String,
    #[serde(deserialize_with = "null_as_default")]
    pub option_b: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

/// Which text provider produced an accepted draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSource {
    Primary,
    Fallback,
}

impl std::fmt::Display for ProviderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderSource::Primary => write!(f, "primary"),
            ProviderSource::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationAttempt {
    pub number: u32,
    pub source: ProviderSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedDraft {
    pub draft: ChapterDraft,
    pub attempt: GenerationAttempt,
}

/// Narrated audio. Serialized the way a Node `Buffer` is, which is what the web client decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioClip(pub Vec<u8>);

impl Serialize for AudioClip {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buffer = serializer.serialize_struct("Buffer", 2)?;
        buffer.serialize_field("type", "Buffer")?;
        buffer.serialize_field("data", &self.0)?;
        buffer.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResult {
    pub content: String,
    pub option_a: String,
    pub option_b: String,
    pub image: String,
    pub title: String,
    pub audio: AudioClip,
}

impl ChapterResult {
    pub fn from_draft(draft: ChapterDraft, audio: AudioClip) -> Self {
        ChapterResult {
            content: draft.content,
            option_a: draft.option_a,
            option_b: draft.option_b,
            image: draft.image,
            title: draft.title,
            audio,
        }
    }
}
