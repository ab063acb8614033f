//! Port traits implemented by infrastructure crates.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`ConfigProvider`] | `ai-config` (HTTP AI-config service) |
//! | [`LlmProvider`] | `llm` (Anthropic Messages API) |
//! | [`EventReporter`] | `ai-config` (served-variant events), [`NoopEventReporter`] |
//!
//! Every trait is object safe so the composition root can inject
//! `Arc<dyn Trait>` values and tests can inject stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    check_template, AgentConfig, AgentId, ConfigProviderError, FailureKind, GenerationParameters,
    ModelError, ModelId, ModelRequest, ModelResponse, PipelineRunId, ProvenanceToken, ReportError,
    ResolutionContext, Timestamp, TokenUsage,
};

// ---------------------------------------------------------------------------
// Configuration provider
// ---------------------------------------------------------------------------

/// A configuration as served by the provider, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether the provider serves this agent as enabled.
    pub enabled: bool,
    /// Model identifier.
    pub model: Option<String>,
    /// Prompt template.
    pub prompt_template: Option<String>,
    /// Generation options.
    #[serde(default)]
    pub parameters: GenerationParameters,
    /// Variant identifier for experiment attribution.
    pub provenance: Option<String>,
}

impl ProviderConfig {
    /// Validates the answer into an [`AgentConfig`] for `agent_id`.
    ///
    /// # Errors
    ///
    /// - [`ConfigProviderError::Disabled`] if the answer is marked disabled.
    /// - [`ConfigProviderError::Malformed`] if the model, template, or
    ///   provenance is missing or blank, or the template does not compile.
    pub fn into_agent_config(self, agent_id: &AgentId) -> Result<AgentConfig, ConfigProviderError> {
        if !self.enabled {
            return Err(ConfigProviderError::Disabled(agent_id.to_string()));
        }
        let model = self
            .model
            .and_then(ModelId::new)
            .ok_or_else(|| ConfigProviderError::Malformed("missing model".into()))?;
        let provenance = self
            .provenance
            .and_then(ProvenanceToken::new)
            .ok_or_else(|| ConfigProviderError::Malformed("missing variation".into()))?;
        let template = self.prompt_template.unwrap_or_default();
        check_template(&template).map_err(|e| ConfigProviderError::Malformed(e.to_string()))?;
        AgentConfig::new(
            agent_id.clone(),
            model,
            template,
            self.parameters,
            provenance,
        )
        .ok_or_else(|| ConfigProviderError::Malformed("missing prompt template".into()))
    }
}

/// Source of runtime agent configuration.
///
/// One call is one attempt; implementations must not retry internally.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Fetches the configuration served for `agent_id` in `context`.
    async fn fetch(
        &self,
        agent_id: &AgentId,
        context: &ResolutionContext,
    ) -> Result<ProviderConfig, ConfigProviderError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Language model
// ---------------------------------------------------------------------------

/// Text-in/text-out language model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates a completion for `request`.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Event reporting
// ---------------------------------------------------------------------------

/// How the node served by a configuration variant ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    /// The node produced its output.
    Success,
    /// The node failed.
    Failure {
        /// Failure classification.
        kind: FailureKind,
    },
}

/// Records that a configuration variant served one node of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigServedEvent {
    /// Run the node belonged to.
    pub run_id: PipelineRunId,
    /// Agent configuration key.
    pub agent_id: AgentId,
    /// Variant that was served.
    pub provenance: ProvenanceToken,
    /// Model the variant selected.
    pub model: ModelId,
    /// How the node ended.
    pub outcome: EventOutcome,
    /// Model calls made.
    pub attempts: u32,
    /// Tokens consumed across those calls.
    pub usage: TokenUsage,
    /// When the node finished.
    pub at: Timestamp,
}

/// Sink for served-variant events.
///
/// `record` buffers and must not block or fail; delivery happens in `flush`.
#[async_trait]
pub trait EventReporter: Send + Sync {
    /// Buffers one event.
    fn record(&self, event: ConfigServedEvent);

    /// Delivers buffered events.
    async fn flush(&self) -> Result<(), ReportError>;
}

/// Reporter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventReporter;

#[async_trait]
impl EventReporter for NoopEventReporter {
    fn record(&self, _event: ConfigServedEvent) {}

    async fn flush(&self) -> Result<(), ReportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn served() -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            model: Some("claude-3-5-haiku-latest".into()),
            prompt_template: Some("Validate {{idea}}".into()),
            parameters: GenerationParameters::new().with("temperature", 0.2),
            provenance: Some("variant-b".into()),
        }
    }

    #[test]
    fn test_provider_config_validates_into_agent_config() {
        let agent = AgentId::new("idea-validator").unwrap();
        let config = served().into_agent_config(&agent).unwrap();

        assert_eq!(config.agent_id(), &agent);
        assert_eq!(config.model().as_str(), "claude-3-5-haiku-latest");
        assert_eq!(config.provenance().as_str(), "variant-b");
        assert_eq!(config.parameters().temperature(), Some(0.2));
        assert!(!config.is_fallback());
    }

    #[test]
    fn test_provider_config_rejections() {
        let agent = AgentId::new("idea-validator").unwrap();

        let disabled = ProviderConfig {
            enabled: false,
            ..served()
        };
        assert!(matches!(
            disabled.into_agent_config(&agent),
            Err(ConfigProviderError::Disabled(_))
        ));

        let no_model = ProviderConfig {
            model: Some(" ".into()),
            ..served()
        };
        assert!(matches!(
            no_model.into_agent_config(&agent),
            Err(ConfigProviderError::Malformed(_))
        ));

        let no_template = ProviderConfig {
            prompt_template: None,
            ..served()
        };
        assert!(matches!(
            no_template.into_agent_config(&agent),
            Err(ConfigProviderError::Malformed(_))
        ));

        let broken_template = ProviderConfig {
            prompt_template: Some("Validate {{ idea".into()),
            ..served()
        };
        let err = broken_template.into_agent_config(&agent).unwrap_err();
        assert!(
            matches!(&err, ConfigProviderError::Malformed(message) if message.contains("template")),
            "{err}"
        );
    }

    #[test]
    fn test_event_outcome_wire_shape() {
        let failure = EventOutcome::Failure {
            kind: FailureKind::Timeout,
        };
        assert_eq!(
            serde_json::to_value(failure).unwrap(),
            serde_json::json!({"status": "failure", "kind": "timeout"})
        );
        assert_eq!(
            serde_json::to_value(EventOutcome::Success).unwrap(),
            serde_json::json!({"status": "success"})
        );
    }
}
