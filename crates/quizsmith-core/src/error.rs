//! Error types shared across the quiz pipeline.
//!
//! `ProviderError` is defined here rather than in `quizsmith-providers` so the
//! generation pipeline can classify provider failures by variant instead of
//! by string matching. `QuizError` is the boundary error: every variant maps
//! onto exactly one [`ErrorCode`] and renders as an [`ErrorBody`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a single bounded call to the AI service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The wall-clock budget expired and the request was cancelled.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Transport failure or non-2xx response.
    #[error("upstream failure ({}): {body}", describe_status(.status))]
    UpstreamFailure { status: Option<u16>, body: String },
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "transport".to_string(),
    }
}

/// The Response Extractor found nothing parseable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no JSON found in response")]
    NoJsonFound,
}

/// Normalization produced zero usable questions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("quiz has no usable questions")]
    EmptyQuiz,
}

/// Error codes carried across the subsystem boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    InvalidAiOutput,
    UpstreamTimeout,
    UpstreamFailure,
    ValidationError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::InvalidAiOutput => "INVALID_AI_OUTPUT",
            ErrorCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ErrorCode::UpstreamFailure => "UPSTREAM_FAILURE",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
        };
        f.write_str(s)
    }
}

/// Failures surfaced by quiz generation and upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("bad request: {0}")]
    BadRequest(String),

    /// `excerpt` holds the leading part of the raw AI text for diagnosis.
    #[error("invalid AI output: {message}")]
    InvalidAiOutput { message: String, excerpt: String },

    #[error("quiz generation took too long ({0}ms)")]
    UpstreamTimeout(u64),

    #[error("AI service error: {0}")]
    UpstreamFailure(ProviderError),

    #[error("invalid quiz file: {0}")]
    Validation(String),
}

impl QuizError {
    pub fn code(&self) -> ErrorCode {
        match self {
            QuizError::BadRequest(_) => ErrorCode::BadRequest,
            QuizError::InvalidAiOutput { .. } => ErrorCode::InvalidAiOutput,
            QuizError::UpstreamTimeout(_) => ErrorCode::UpstreamTimeout,
            QuizError::UpstreamFailure(_) => ErrorCode::UpstreamFailure,
            QuizError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Render the standard `{ ok: false, code, message, detail? }` shape.
    pub fn to_body(&self) -> ErrorBody {
        let detail = match self {
            QuizError::InvalidAiOutput { excerpt, .. } => Some(excerpt.clone()),
            QuizError::UpstreamFailure(ProviderError::UpstreamFailure { status, body }) => Some(
                match status {
                    Some(status) => format!("HTTP {status}: {body}"),
                    None => body.clone(),
                },
            ),
            _ => None,
        };
        ErrorBody {
            ok: false,
            code: self.code(),
            message: self.to_string(),
            detail,
        }
    }
}

impl From<ProviderError> for QuizError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(ms) => QuizError::UpstreamTimeout(ms),
            other => QuizError::UpstreamFailure(other),
        }
    }
}

/// Wire shape of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
