//! [`ConfigProvider`] over the AI-config service's evaluation endpoint.
//!
//! ## Wire protocol
//!
//! ```text
//! POST {base_url}/v1/agent-configs/{agent_id}/evaluate
//! Authorization: {sdk_key}
//!
//! { "context": { "kind": "user", "key": "<user key>", ...brief attributes } }
//! ```
//!
//! The service answers with the variant served to that context:
//!
//! ```json
//! {
//!   "model": { "name": "claude-3-5-haiku-latest", "parameters": { "temperature": 0.2 } },
//!   "instructions": "You validate ideas. Idea: {{ idea }}",
//!   "_ldMeta": { "enabled": true, "variationKey": "variant-b" }
//! }
//! ```
//!
//! Template placeholders are returned unrendered; rendering happens in the
//! pipeline against the node's own context.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    keys, AgentId, ConfigProvider, ConfigProviderError, GenerationParameters, ProviderConfig,
    ResolutionContext,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Context key used when the run carries no user key.
pub const ANONYMOUS_CONTEXT_KEY: &str = "anonymous";

/// Brief attributes forwarded for targeting rules.
const TARGETING_ATTRIBUTES: [&str; 3] = [keys::TARGET_AUDIENCE, keys::EXPECTED_USERS, keys::BUDGET];

/// Connection settings shared by the provider and the event reporter.
#[derive(Debug, Clone)]
pub struct AiConfigSettings {
    /// Service root, without a trailing slash.
    pub base_url: String,
    /// Server-side SDK key.
    pub sdk_key: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl AiConfigSettings {
    /// Per-request timeout unless overridden.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates settings with the default timeout.
    pub fn new(base_url: impl Into<String>, sdk_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sdk_key,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EvaluationRequest<'a> {
    context: EvaluationContext<'a>,
}

#[derive(Debug, Serialize)]
struct EvaluationContext<'a> {
    kind: &'static str,
    key: &'a str,
    #[serde(flatten)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct EvaluationResponse {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    model: Option<ModelSection>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default, rename = "_ldMeta")]
    meta: Option<Meta>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelSection {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parameters: GenerationParameters,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default, rename = "variationKey")]
    variation_key: Option<String>,
}

impl From<EvaluationResponse> for ProviderConfig {
    fn from(response: EvaluationResponse) -> Self {
        let meta = response.meta.unwrap_or_default();
        let model = response.model.unwrap_or_default();
        ProviderConfig {
            enabled: meta.enabled.or(response.enabled).unwrap_or(false),
            model: model.name,
            prompt_template: response.instructions,
            parameters: model.parameters,
            provenance: meta.variation_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Fetches agent configurations from the AI-config service.
///
/// Each [`ConfigProvider::fetch`] is exactly one HTTP request.
#[derive(Debug, Clone)]
pub struct HttpConfigProvider {
    client: reqwest::Client,
    settings: AiConfigSettings,
}

impl HttpConfigProvider {
    /// Creates a provider for `settings`.
    pub fn new(settings: AiConfigSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body<'a>(context: &'a ResolutionContext) -> EvaluationRequest<'a> {
        let key = context
            .user_key()
            .map(|k| k.as_str())
            .unwrap_or(ANONYMOUS_CONTEXT_KEY);
        let attributes = TARGETING_ATTRIBUTES
            .iter()
            .filter_map(|name| {
                context
                    .get(name)
                    .map(|value| (name.to_string(), serde_json::Value::from(value)))
            })
            .collect();
        EvaluationRequest {
            context: EvaluationContext {
                kind: "user",
                key,
                attributes,
            },
        }
    }
}

#[async_trait]
impl ConfigProvider for HttpConfigProvider {
    async fn fetch(
        &self,
        agent_id: &AgentId,
        context: &ResolutionContext,
    ) -> Result<ProviderConfig, ConfigProviderError> {
        let url = format!(
            "{}/v1/agent-configs/{}/evaluate",
            self.settings.base_url, agent_id
        );
        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.settings.sdk_key.expose_secret(),
            )
            .timeout(self.settings.timeout)
            .json(&Self::request_body(context))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigProviderError::Unavailable(format!(
                "evaluation of {agent_id} returned {status}"
            )));
        }

        let body: EvaluationResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ConfigProviderError::Timeout
            } else {
                ConfigProviderError::Malformed(e.to_string())
            }
        })?;

        debug!(agent = %agent_id, "AI-config evaluation received");
        Ok(body.into())
    }

    fn name(&self) -> &str {
        "ai-config"
    }
}

fn classify_transport(error: reqwest::Error) -> ConfigProviderError {
    if error.is_timeout() {
        ConfigProviderError::Timeout
    } else {
        ConfigProviderError::Unavailable(error.to_string())
    }
}
