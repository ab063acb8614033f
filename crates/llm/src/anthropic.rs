//! [`LlmProvider`] implementation for the Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{LlmProvider, ModelError, ModelRequest, ModelResponse};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::messages::{MessagesRequest, MessagesResponse};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic status code for a temporarily overloaded API.
const OVERLOADED: u16 = 529;

/// Calls `POST {base_url}/v1/messages` once per [`LlmProvider::generate`].
///
/// The rendered prompt is sent as the system prompt and the role instruction
/// as the single user turn. Every failure is classified into a
/// [`ModelError`]; retries are left to the caller.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
    /// Per-request timeout unless overridden.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Creates a provider for the production API.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Points the provider at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn classify_transport(&self, error: reqwest::Error) -> ModelError {
        if error.is_timeout() {
            ModelError::Timeout {
                elapsed: self.timeout,
            }
        } else {
            ModelError::ProviderUnavailable {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let body = MessagesRequest::from_model_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        debug!(model = %request.model, max_tokens = body.max_tokens, "Sending Anthropic request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Anthropic request rejected");
            return Err(classify_status(status, retry_after, detail));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify_transport(e)
            } else {
                ModelError::InvalidResponse {
                    message: format!("unreadable response body: {e}"),
                }
            }
        })?;

        let text = parsed.text().ok_or_else(|| ModelError::InvalidResponse {
            message: "response has no text content".into(),
        })?;

        let mut out = ModelResponse::new(text);
        if let Some(usage) = parsed.token_usage() {
            out = out.with_usage(usage);
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Maps a non-success status onto the model error taxonomy.
fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    detail: String,
) -> ModelError {
    match status.as_u16() {
        429 | OVERLOADED => ModelError::RateLimited { retry_after },
        401 | 403 => ModelError::ProviderUnavailable {
            message: format!("authentication failed ({status})"),
        },
        500..=599 => ModelError::ProviderUnavailable {
            message: format!("server error ({status}): {detail}"),
        },
        _ => ModelError::InvalidResponse {
            message: format!("request rejected ({status}): {detail}"),
        },
    }
}

/// Reads a `retry-after` header expressed in whole seconds.
fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
