//! Configuration loading and provider factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizsmith_core::traits::{AiProvider, CompletionOptions};

use crate::openai::OpenAiProvider;

/// Connection settings for the AI provider.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.api_key.is_empty() { "" } else { "***" };
        f.debug_struct("ProviderSettings")
            .field("api_key", &key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Generation defaults applied to every AI call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Hard wall-clock budget for one AI call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_output_language")]
    pub output_language: String,
}

fn default_max_tokens() -> u32 {
    CompletionOptions::default().max_tokens
}
fn default_temperature() -> f64 {
    CompletionOptions::default().temperature
}
fn default_timeout_ms() -> u64 {
    CompletionOptions::default().timeout_ms
}
fn default_output_language() -> String {
    "English".to_string()
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
            output_language: default_output_language(),
        }
    }
}

impl GenerationSettings {
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Defaults for quiz-taking sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Whether new sessions start with proctoring enabled.
    #[serde(default)]
    pub proctoring: bool,
}

/// Top-level quizsmith configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizsmithConfig {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to an empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizsmith.toml` in the current directory
/// 2. `~/.config/quizsmith/config.toml`
///
/// Environment variable overrides: `QUIZSMITH_API_KEY`, `QUIZSMITH_MODEL`,
/// `QUIZSMITH_BASE_URL`.
pub fn load_config() -> Result<QuizsmithConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizsmithConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizsmith.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizsmithConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizsmithConfig::default(),
    };

    apply_env_overrides(&mut config);

    config.provider.api_key = resolve_env_vars(&config.provider.api_key);
    config.provider.base_url = resolve_env_vars(&config.provider.base_url);
    config.provider.model = resolve_env_vars(&config.provider.model);

    Ok(config)
}

fn apply_env_overrides(config: &mut QuizsmithConfig) {
    if let Ok(key) = std::env::var("QUIZSMITH_API_KEY") {
        config.provider.api_key = key;
    }
    if let Ok(model) = std::env::var("QUIZSMITH_MODEL") {
        config.provider.model = model;
    }
    if let Ok(url) = std::env::var("QUIZSMITH_BASE_URL") {
        config.provider.base_url = url;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizsmith"))
}

/// Create the configured provider.
pub fn create_provider(config: &QuizsmithConfig) -> Result<Arc<dyn AiProvider>> {
    if config.provider.api_key.is_empty() {
        tracing::warn!("no API key configured; requests will be sent unauthenticated");
    }
    Ok(Arc::new(OpenAiProvider::new(&config.provider)?))
}
