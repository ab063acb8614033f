//! The agent node: one contract, three roles.
//!
//! Every node performs the same sequence:
//!
//! 1. Build the [`ResolutionContext`] the role may see from [`PipelineState`].
//! 2. Resolve its [`AgentConfig`] (never fails; falls back to defaults).
//! 3. Render the prompt template against the context. A served template that
//!    fails to render is replaced by the role's built-in default.
//! 4. Call the model, retrying only `RateLimited` failures within the budget.
//! 5. Parse the answer into the role's structured output.
//!
//! The node never mutates state. It returns a [`NodeReport`] that the executor
//! merges and reports.

use pipeline::{
    render_template, AgentConfig, AgentRole, ConfigServedEvent, EventOutcome, FailureKind,
    LandingPage, ModelError, ModelRequest, NodeFailure, NodeOutput, ParseError, PipelineRunId,
    PipelineState, ResolutionContext, RetryPolicy, TechStackRecommendation, TemplateError,
    Timestamp, TokenUsage, ValidationResult,
};
use tracing::{debug, instrument, warn};

use crate::{BackoffPolicy, ConfigResolver, ModelInvoker};

/// Result of one node run as seen by the orchestration graph.
pub type NodeOutcome = Result<NodeOutput, NodeFailure>;

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Shared collaborators injected into every node call.
#[derive(Debug, Clone)]
pub struct NodeServices {
    resolver: ConfigResolver,
    invoker: ModelInvoker,
    backoff: BackoffPolicy,
}

impl NodeServices {
    /// Bundles the resolver and invoker with the default retry budget.
    pub fn new(resolver: ConfigResolver, invoker: ModelInvoker) -> Self {
        Self {
            resolver,
            invoker,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Replaces the retry budget.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// The configured retry budget.
    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything one node run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeReport {
    /// Node that ran.
    pub role: AgentRole,
    /// Configuration the node ran with.
    pub config: AgentConfig,
    /// Output or failure.
    pub outcome: NodeOutcome,
    /// Model calls made.
    pub attempts: u32,
    /// Tokens consumed across those calls.
    pub usage: TokenUsage,
}

impl NodeReport {
    /// Builds the served-variant event for this report.
    pub fn served_event(&self, run_id: PipelineRunId) -> ConfigServedEvent {
        let outcome = match &self.outcome {
            Ok(_) => EventOutcome::Success,
            Err(failure) => EventOutcome::Failure { kind: failure.kind },
        };
        ConfigServedEvent {
            run_id,
            agent_id: self.config.agent_id().clone(),
            provenance: self.config.provenance().clone(),
            model: self.config.model().clone(),
            outcome,
            attempts: self.attempts,
            usage: self.usage,
            at: Timestamp::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A pipeline node parametrised by its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentNode {
    role: AgentRole,
}

impl AgentNode {
    /// Creates the node for `role`.
    pub fn new(role: AgentRole) -> Self {
        Self { role }
    }

    /// The node's role.
    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// The context this node may see.
    pub fn build_context(&self, state: &PipelineState) -> ResolutionContext {
        state.context_for(self.role)
    }

    /// Renders `config`'s template against `context`. Pure.
    ///
    /// # Errors
    ///
    /// Returns the [`TemplateError`] raised while rendering.
    pub fn render_prompt(
        &self,
        config: &AgentConfig,
        context: &ResolutionContext,
    ) -> Result<String, TemplateError> {
        render_template(config.prompt_template(), context)
    }

    /// Parses raw model text into this role's structured output.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] of the role's output contract.
    pub fn parse_output(&self, text: &str) -> Result<NodeOutput, ParseError> {
        match self.role {
            AgentRole::Validator => ValidationResult::parse(text).map(NodeOutput::Validation),
            AgentRole::LandingPageWriter => LandingPage::parse(text).map(NodeOutput::LandingPage),
            AgentRole::TechStackRecommender => {
                TechStackRecommendation::parse(text).map(NodeOutput::TechStack)
            }
        }
    }

    /// Runs the node against `state`.
    ///
    /// Never returns an error: every failure is carried in
    /// [`NodeReport::outcome`].
    #[instrument(skip_all, fields(agent = %self.role))]
    pub async fn run(&self, services: &NodeServices, state: &PipelineState) -> NodeReport {
        let context = self.build_context(state);
        let served = services.resolver.resolve(self.role, &context).await;
        let (config, prompt) = match self.render_prompt(&served, &context) {
            Ok(prompt) => (served, prompt),
            Err(error) => {
                warn!(
                    provenance = %served.provenance(),
                    error = %error,
                    "Served template failed to render; using default"
                );
                let fallback = AgentConfig::fallback(self.role);
                match self.render_prompt(&fallback, &context) {
                    Ok(prompt) => (fallback, prompt),
                    Err(error) => return self.unrendered(fallback, &error),
                }
            }
        };
        let request = ModelRequest::from_config(&config, prompt, self.role.instruction());

        let backoff = services.backoff;
        let mut attempts = 0u32;
        let mut usage = TokenUsage::default();

        let outcome = loop {
            attempts += 1;
            match services.invoker.invoke(&request).await {
                Ok(response) => {
                    if let Some(reported) = response.usage {
                        usage += reported;
                    }
                    break self.parse_output(&response.text).map_err(|e| NodeFailure {
                        agent: self.role,
                        kind: FailureKind::MalformedOutput,
                        message: e.to_string(),
                        attempts,
                    });
                }
                Err(error) => {
                    if let RetryPolicy::Retryable { after } = error.retry_policy() {
                        if backoff.allows_retry(attempts) {
                            let delay = backoff.delay_after(attempts, after);
                            debug!(
                                attempt = attempts,
                                delay_ms = delay.as_millis() as u64,
                                "Retrying model call"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    break Err(self.failure(&error, attempts));
                }
            }
        };

        if let Err(failure) = &outcome {
            warn!(kind = %failure.kind, attempts, error = %failure.message, "Node failed");
        } else {
            debug!(attempts, "Node succeeded");
        }

        NodeReport {
            role: self.role,
            config,
            outcome,
            attempts,
            usage,
        }
    }

    fn unrendered(&self, config: AgentConfig, error: &TemplateError) -> NodeReport {
        warn!(error = %error, "Default template failed to render");
        NodeReport {
            role: self.role,
            config,
            outcome: Err(NodeFailure {
                agent: self.role,
                kind: FailureKind::MalformedOutput,
                message: error.to_string(),
                attempts: 0,
            }),
            attempts: 0,
            usage: TokenUsage::default(),
        }
    }

    fn failure(&self, error: &ModelError, attempts: u32) -> NodeFailure {
        NodeFailure {
            agent: self.role,
            kind: error.kind(),
            message: error.to_string(),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{keys, IdeaBrief, Verdict};

    #[test]
    fn test_parse_output_dispatches_on_role() {
        let validator = AgentNode::new(AgentRole::Validator);
        assert!(matches!(
            validator.parse_output("Verdict: promising\nReal demand."),
            Ok(NodeOutput::Validation(ValidationResult {
                verdict: Verdict::Promising,
                ..
            }))
        ));

        let writer = AgentNode::new(AgentRole::LandingPageWriter);
        assert!(matches!(
            writer.parse_output("# PlantPal"),
            Ok(NodeOutput::LandingPage(_))
        ));

        let advisor = AgentNode::new(AgentRole::TechStackRecommender);
        assert_eq!(
            advisor.parse_output("no bullets here"),
            Err(ParseError::NoTechChoices)
        );
    }

    #[test]
    fn test_render_prompt_is_deterministic() {
        let state = PipelineState::new(
            IdeaBrief::new("AI-powered plant watering reminder app")
                .with_target_audience("busy renters"),
        )
        .unwrap();
        let node = AgentNode::new(AgentRole::Validator);
        let config = AgentConfig::fallback(AgentRole::Validator);
        let context = node.build_context(&state);

        let first = node.render_prompt(&config, &context).unwrap();
        let second = node
            .render_prompt(&config, &node.build_context(&state))
            .unwrap();

        assert_eq!(first, second);
        assert!(first.contains("AI-powered plant watering reminder app"));
        assert_eq!(context.get(keys::TARGET_AUDIENCE), Some("busy renters"));
    }
}
