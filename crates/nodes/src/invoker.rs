//! LLM gateway: every model call goes through [`ModelInvoker`].
//!
//! The invoker bounds each call with a timeout and applies minimal structural
//! validation to the answer. It renders nothing and never retries; retry
//! decisions belong to the calling node.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{LlmProvider, ModelError, ModelRequest, ModelResponse};
use tracing::debug;

/// Wraps an [`LlmProvider`] with a per-call timeout and response validation.
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl ModelInvoker {
    /// Time allowed for one model call unless overridden.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Creates an invoker for `provider`.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Calls the model once.
    ///
    /// # Errors
    ///
    /// - [`ModelError::Timeout`] if the call exceeds the timeout.
    /// - [`ModelError::InvalidResponse`] if the answer is empty or whitespace.
    /// - Any error the provider classified itself.
    pub async fn invoke(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        debug!(
            provider = self.provider.name(),
            model = %request.model,
            prompt_bytes = request.prompt.len(),
            "Invoking model"
        );

        let response = tokio::time::timeout(self.timeout, self.provider.generate(request))
            .await
            .map_err(|_| ModelError::Timeout {
                elapsed: self.timeout,
            })??;

        if response.text.trim().is_empty() {
            return Err(ModelError::InvalidResponse {
                message: "model returned an empty completion".into(),
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline::{AgentConfig, AgentRole, TokenUsage};

    struct FixedProvider {
        result: Result<&'static str, ModelError>,
        delay: Duration,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse, ModelError> {
            tokio::time::sleep(self.delay).await;
            self.result
                .clone()
                .map(|text| ModelResponse::new(text).with_usage(TokenUsage::new(10, 4)))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn invoker(result: Result<&'static str, ModelError>, delay: Duration) -> ModelInvoker {
        ModelInvoker::new(Arc::new(FixedProvider { result, delay }))
            .with_timeout(Duration::from_millis(50))
    }

    fn request() -> ModelRequest {
        let config = AgentConfig::fallback(AgentRole::Validator);
        ModelRequest::from_config(&config, "prompt", AgentRole::Validator.instruction())
    }

    #[tokio::test]
    async fn test_successful_call_passes_through() {
        let response = invoker(Ok("Verdict: promising"), Duration::ZERO)
            .invoke(&request())
            .await
            .unwrap();
        assert_eq!(response.text, "Verdict: promising");
        assert_eq!(response.usage, Some(TokenUsage::new(10, 4)));
    }

    #[tokio::test]
    async fn test_blank_completion_is_invalid_response() {
        let err = invoker(Ok("  \n "), Duration::ZERO)
            .invoke(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let err = invoker(Ok("late"), Duration::from_secs(10))
            .invoke(&request())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Timeout {
                elapsed: Duration::from_millis(50)
            }
        );
    }

    #[tokio::test]
    async fn test_provider_errors_propagate_unchanged() {
        let err = invoker(
            Err(ModelError::ProviderUnavailable {
                message: "401 Unauthorized".into(),
            }),
            Duration::ZERO,
        )
        .invoke(&request())
        .await
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::ProviderUnavailable {
                message: "401 Unauthorized".into()
            }
        );
    }
}
