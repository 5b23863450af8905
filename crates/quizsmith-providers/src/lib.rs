//! quizsmith-providers — AI provider integrations.
//!
//! Implements the `AiProvider` trait for OpenAI-compatible chat endpoints
//! and loads the `quizsmith.toml` configuration.

pub mod config;
pub mod mock;
pub mod openai;

pub use config::{
    create_provider, load_config, load_config_from, GenerationSettings, ProviderSettings,
    QuizsmithConfig, SessionSettings,
};
pub use quizsmith_core::error::ProviderError;
