//! Core trait definitions for AI providers.
//!
//! The trait is implemented by `quizsmith-providers`. Keeping it here lets
//! the generation pipeline be tested against in-process fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Trait for AI backends that turn a prompt into raw text.
///
/// Implementations issue exactly one outbound call per invocation, enforce
/// `timeout_ms` as a hard wall-clock budget, and never retry on their own.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Send one prompt and return the raw response text.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError>;
}

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Hard wall-clock budget for the whole call.
    pub timeout_ms: u64,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
            timeout_ms: 45_000,
        }
    }
}

/// System prompt sent alongside quiz generation prompts.
pub const QUIZ_SYSTEM_PROMPT: &str = "You are an assessment author. You write clear, unambiguous quiz questions and respond ONLY with a single JSON object matching the schema you are given. Do not wrap the JSON in prose.";
