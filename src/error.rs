use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::services::repair::RepairError;
use crate::utils::response::FailureBody;

/// How a provider failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Quota or rate limit hit; another provider may still answer.
    RateLimited,
    /// Timeouts, dropped connections, upstream 5xx.
    Transient,
    Fatal,
}

#[derive(Debug, Clone, Error)]
#[error("{provider} failed ({kind:?}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub provider: &'static str,
    /// Upstream HTTP status, when the provider answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        provider: &'static str,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        ProviderError {
            kind,
            provider,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Classifies an HTTP error response.
    pub fn from_status(provider: &'static str, status: u16, body: impl Into<String>) -> Self {
        let kind = match status {
            429 => ProviderErrorKind::RateLimited,
            408 | 500..=599 => ProviderErrorKind::Transient,
            _ => ProviderErrorKind::Fatal,
        };
        ProviderError::new(provider, kind, body).with_status(status)
    }

    /// Classifies a transport failure.
    pub fn from_transport(provider: &'static str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
            ProviderErrorKind::Transient
        } else {
            ProviderErrorKind::Fatal
        };
        let error = ProviderError::new(provider, kind, err.to_string());
        match err.status() {
            Some(status) => error.with_status(status.as_u16()),
            None => error,
        }
    }
}

/// Why a single model reply could not be used as a chapter.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("malformed model output: {0}")]
    MalformedModelOutput(#[from] RepairError),

    #[error("incomplete draft: {0}")]
    IncompleteDraft(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStage {
    Audio,
    Image,
}

impl std::fmt::Display for MediaStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaStage::Audio => write!(f, "audio"),
            MediaStage::Image => write!(f, "image"),
        }
    }
}

/// Failures that end a chapter request.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("no valid chapter after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{stage} composition failed: {source}")]
    MediaComposition {
        stage: MediaStage,
        #[source]
        source: ProviderError,
    },
}

impl StoryError {
    pub fn status_code(&self) -> StatusCode {
        let upstream = match self {
            StoryError::RetriesExhausted { .. } => None,
            StoryError::Provider(err) | StoryError::MediaComposition { source: err, .. } => {
                err.status
            }
        };
        upstream
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// What the caller gets to see. Details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            StoryError::RetriesExhausted { .. } => {
                "Unable to generate a valid chapter after several attempts."
            }
            StoryError::Provider(_) => "Unable to generate a valid chapter, please try again.",
            StoryError::MediaComposition {
                stage: MediaStage::Audio,
                ..
            } => "Unable to generate the chapter narration, please try again.",
            StoryError::MediaComposition {
                stage: MediaStage::Image,
                ..
            } => "Unable to generate the story cover, please try again.",
        }
    }
}

/// Failure envelope returned by the HTTP layer.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }
}

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        ApiError::new(err.status_code(), err.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = FailureBody {
            code: self.status.as_u16(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
