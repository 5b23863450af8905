//! Mock provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use quizsmith_core::error::ProviderError;
use quizsmith_core::traits::{AiProvider, CompletionOptions};

/// A mock AI provider for exercising the generation pipeline without real API calls.
///
/// Returns configurable responses based on prompt content matching. A
/// configured delay is subject to the same `timeout_ms` budget as a real call.
pub struct MockProvider {
    /// Map of prompt substring → response text.
    responses: HashMap<String, String>,
    /// Result if no prompt matches.
    default_response: Result<String, ProviderError>,
    delay: Option<Duration>,
    call_count: AtomicU32,
    last_prompt: Mutex<Option<String>>,
}

impl MockProvider {
    /// Create a new mock provider with the given prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: Ok("{}".to_string()),
            delay: None,
            call_count: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: Ok(response.to_string()),
            ..Self::new(HashMap::new())
        }
    }

    /// Create a mock whose every call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            default_response: Err(error),
            ..Self::new(HashMap::new())
        }
    }

    /// Delay every response by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last prompt sent to this provider.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn respond(&self, prompt: &str) -> Result<String, ProviderError> {
        self.responses
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, v)| Ok(v.clone()))
            .unwrap_or_else(|| self.default_response.clone())
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(prompt.to_string());

        let Some(delay) = self.delay else {
            return self.respond(prompt);
        };
        let budget = Duration::from_millis(options.timeout_ms);
        match tokio::time::timeout(budget, tokio::time::sleep(delay)).await {
            Ok(()) => self.respond(prompt),
            Err(_) => Err(ProviderError::Timeout(options.timeout_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(timeout_ms: u64) -> CompletionOptions {
        CompletionOptions {
            timeout_ms,
            ..CompletionOptions::default()
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("{\"title\": \"t\"}");
        let text = provider.complete("anything", &options(1000)).await.unwrap();
        assert_eq!(text, "{\"title\": \"t\"}");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_prompt().as_deref(), Some("anything"));
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert("closures".to_string(), "{\"title\": \"Closures\"}".to_string());
        responses.insert("traits".to_string(), "{\"title\": \"Traits\"}".to_string());

        let provider = MockProvider::new(responses);

        let text = provider
            .complete("a quiz about closures", &options(1000))
            .await
            .unwrap();
        assert!(text.contains("Closures"));

        let text = provider
            .complete("a quiz about traits", &options(1000))
            .await
            .unwrap();
        assert!(text.contains("Traits"));

        let text = provider.complete("unmatched", &options(1000)).await.unwrap();
        assert_eq!(text, "{}");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_beyond_budget_times_out() {
        let provider = MockProvider::with_fixed_response("{}").with_delay(Duration::from_secs(60));
        let err = provider.complete("x", &options(250)).await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout(250));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_within_budget_succeeds() {
        let provider = MockProvider::with_fixed_response("ok").with_delay(Duration::from_millis(10));
        assert_eq!(provider.complete("x", &options(250)).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn failing_mock_returns_error() {
        let provider = MockProvider::failing(ProviderError::UpstreamFailure {
            status: Some(502),
            body: "bad gateway".into(),
        });
        let err = provider.complete("x", &options(1000)).await.unwrap_err();
        assert!(!err.is_timeout());
    }
}
