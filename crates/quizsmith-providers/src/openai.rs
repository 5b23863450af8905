//! OpenAI-compatible chat-completions provider.
//!
//! Each call is bounded by `CompletionOptions::timeout_ms`. On expiry the
//! in-flight request future is dropped, which aborts the HTTP exchange and
//! releases its connection, and a [`ProviderError::Timeout`] is returned.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizsmith_core::error::ProviderError;
use quizsmith_core::traits::{AiProvider, CompletionOptions, QUIZ_SYSTEM_PROMPT};

use crate::config::ProviderSettings;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, prompt: &str, options: &CompletionOptions) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: QUIZ_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("content-type", "application/json");
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(options.timeout_ms)
            } else {
                ProviderError::UpstreamFailure {
                    status: None,
                    body: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UpstreamFailure {
                status: Some(status.as_u16()),
                body,
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::UpstreamFailure {
                    status: Some(status.as_u16()),
                    body: format!("failed to parse response: {e}"),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::UpstreamFailure {
                status: Some(status.as_u16()),
                body: "response contained no choices".to_string(),
            })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, prompt, options), fields(model = %self.model, timeout_ms = options.timeout_ms))]
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let start = Instant::now();
        let budget = Duration::from_millis(options.timeout_ms);

        let result = match tokio::time::timeout(budget, self.send(prompt, options)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(options.timeout_ms)),
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => tracing::debug!(latency_ms, chars = text.len(), "completion received"),
            Err(e) => tracing::warn!(latency_ms, "completion failed: {e}"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer, api_key: &str) -> ProviderSettings {
        ProviderSettings {
            api_key: api_key.into(),
            base_url: server.uri(),
            model: "gpt-4.1-mini".into(),
        }
    }

    fn options(timeout_ms: u64) -> CompletionOptions {
        CompletionOptions {
            max_tokens: 512,
            temperature: 0.2,
            timeout_ms,
        }
    }

    #[tokio::test]
    async fn successful_completion() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": "{\"title\": \"Rust\"}", "role": "assistant"}, "index": 0}],
            "model": "gpt-4.1-mini"
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&settings(&server, "test-key")).unwrap();
        let text = provider.complete("make a quiz", &options(5_000)).await.unwrap();
        assert_eq!(text, "{\"title\": \"Rust\"}");
    }

    #[tokio::test]
    async fn non_2xx_is_upstream_failure_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&settings(&server, "key")).unwrap();
        let err = provider.complete("x", &options(5_000)).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::UpstreamFailure {
                status: Some(500),
                body: "internal error".into()
            }
        );
    }

    #[tokio::test]
    async fn slow_upstream_times_out_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(2_000))
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&settings(&server, "key")).unwrap();
        let started = Instant::now();
        let err = provider.complete("x", &options(100)).await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout(100));
        assert!(started.elapsed() < Duration::from_millis(1_500));
    }

    #[tokio::test]
    async fn empty_choices_is_upstream_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&settings(&server, "")).unwrap();
        let err = provider.complete("x", &options(5_000)).await.unwrap_err();
        assert!(matches!(err, ProviderError::UpstreamFailure { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_upstream_failure() {
        let settings = ProviderSettings {
            api_key: "key".into(),
            base_url: "http://127.0.0.1:9".into(),
            model: "m".into(),
        };
        let provider = OpenAiProvider::new(&settings).unwrap();
        let err = provider.complete("x", &options(5_000)).await.unwrap_err();
        assert!(matches!(err, ProviderError::UpstreamFailure { status: None, .. }));
    }
}
