//! Run-scoped pipeline state and the orchestration state machine.
//!
//! [`PipelineState`] is the accumulating record passed through the three
//! nodes. It enforces its own write discipline: the idea is fixed at
//! construction, each output field is written at most once and only after the
//! outputs it depends on, and the error list is append-only. Nodes never
//! touch it directly; they return a [`NodeOutput`] that the executor merges
//! with [`PipelineState::apply`].
//!
//! [`Stage`] is the state machine the executor walks:
//!
//! ```text
//! Start ─► RanValidator ─► RanLandingPage ─► RanTechStack ─► Done
//!   │           │                │
//!   └───────────┴────────────────┴──────────► Failed
//! ```

use serde::{Deserialize, Serialize};

use crate::agent::keys;
use crate::{
    AgentRole, LandingPage, LaunchpadError, NodeFailure, PipelineRunId, ResolutionContext,
    TechStackRecommendation, Timestamp, TokenUsage, UserKey, ValidationResult,
};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The idea plus optional details collected from the founder.
///
/// Every present detail is visible to every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaBrief {
    /// Raw idea text (required).
    pub idea: String,
    /// Targeting key for configuration variant assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_key: Option<UserKey>,
    /// Who the product is for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    /// The problem it solves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
    /// One-line unique value proposition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_value_prop: Option<String>,
    /// Expected user volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_users: Option<String>,
    /// Infrastructure budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    /// Skills of the team.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_expertise: Option<String>,
}

impl IdeaBrief {
    /// Creates a brief carrying only the idea.
    pub fn new(idea: impl Into<String>) -> Self {
        Self {
            idea: idea.into(),
            ..Default::default()
        }
    }

    /// Sets the targeting key.
    pub fn with_user_key(mut self, key: UserKey) -> Self {
        self.user_key = Some(key);
        self
    }

    /// Sets the target audience.
    pub fn with_target_audience(mut self, value: impl Into<String>) -> Self {
        self.target_audience = Some(value.into());
        self
    }

    /// Sets the problem statement.
    pub fn with_problem_statement(mut self, value: impl Into<String>) -> Self {
        self.problem_statement = Some(value.into());
        self
    }

    /// Sets the unique value proposition.
    pub fn with_unique_value_prop(mut self, value: impl Into<String>) -> Self {
        self.unique_value_prop = Some(value.into());
        self
    }

    /// Sets the expected user volume.
    pub fn with_expected_users(mut self, value: impl Into<String>) -> Self {
        self.expected_users = Some(value.into());
        self
    }

    /// Sets the infrastructure budget.
    pub fn with_budget(mut self, value: impl Into<String>) -> Self {
        self.budget = Some(value.into());
        self
    }

    /// Sets the team expertise.
    pub fn with_team_expertise(mut self, value: impl Into<String>) -> Self {
        self.team_expertise = Some(value.into());
        self
    }

    /// Trims every field and drops optional details that end up empty.
    fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            idea: self.idea.trim().to_string(),
            user_key: self.user_key,
            target_audience: clean(self.target_audience),
            problem_statement: clean(self.problem_statement),
            unique_value_prop: clean(self.unique_value_prop),
            expected_users: clean(self.expected_users),
            budget: clean(self.budget),
            team_expertise: clean(self.team_expertise),
        }
    }
}

// ---------------------------------------------------------------------------
// Node outputs
// ---------------------------------------------------------------------------

/// Successful output of one node, ready to merge into [`PipelineState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "agent", content = "output", rename_all = "snake_case")]
pub enum NodeOutput {
    /// Validator output.
    Validation(ValidationResult),
    /// LandingPageWriter output.
    LandingPage(LandingPage),
    /// TechStackRecommender output.
    TechStack(TechStackRecommendation),
}

impl NodeOutput {
    /// The role that owns this output.
    pub fn role(&self) -> AgentRole {
        match self {
            NodeOutput::Validation(_) => AgentRole::Validator,
            NodeOutput::LandingPage(_) => AgentRole::LandingPageWriter,
            NodeOutput::TechStack(_) => AgentRole::TechStackRecommender,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The run-scoped accumulating record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    brief: IdeaBrief,
    validation_result: Option<ValidationResult>,
    landing_page: Option<LandingPage>,
    tech_stack: Option<TechStackRecommendation>,
    errors: Vec<NodeFailure>,
}

impl PipelineState {
    /// Creates the initial state for a run.
    ///
    /// # Errors
    ///
    /// [`LaunchpadError::EmptyIdea`] if the idea is empty after trimming.
    pub fn new(brief: IdeaBrief) -> Result<Self, LaunchpadError> {
        let brief = brief.normalized();
        if brief.idea.is_empty() {
            return Err(LaunchpadError::EmptyIdea);
        }
        Ok(Self {
            brief,
            validation_result: None,
            landing_page: None,
            tech_stack: None,
            errors: Vec::new(),
        })
    }

    /// The idea text.
    pub fn idea(&self) -> &str {
        &self.brief.idea
    }

    /// The full brief the run started from.
    pub fn brief(&self) -> &IdeaBrief {
        &self.brief
    }

    /// Validator output, once written.
    pub fn validation_result(&self) -> Option<&ValidationResult> {
        self.validation_result.as_ref()
    }

    /// LandingPageWriter output, once written.
    pub fn landing_page(&self) -> Option<&LandingPage> {
        self.landing_page.as_ref()
    }

    /// TechStackRecommender output, once written.
    pub fn tech_stack(&self) -> Option<&TechStackRecommendation> {
        self.tech_stack.as_ref()
    }

    /// Failures recorded so far, in order.
    pub fn errors(&self) -> &[NodeFailure] {
        &self.errors
    }

    /// Builds the context `role` may see: the brief plus the outputs of every
    /// node that precedes it. Outputs of later nodes are never included.
    pub fn context_for(&self, role: AgentRole) -> ResolutionContext {
        let brief = &self.brief;
        let mut ctx = ResolutionContext::new(brief.user_key.clone());
        ctx.insert(keys::IDEA, brief.idea.as_str());
        ctx.insert_opt(keys::TARGET_AUDIENCE, brief.target_audience.as_deref());
        ctx.insert_opt(keys::PROBLEM_STATEMENT, brief.problem_statement.as_deref());
        ctx.insert_opt(keys::UNIQUE_VALUE_PROP, brief.unique_value_prop.as_deref());
        ctx.insert_opt(keys::EXPECTED_USERS, brief.expected_users.as_deref());
        ctx.insert_opt(keys::BUDGET, brief.budget.as_deref());
        ctx.insert_opt(keys::TEAM_EXPERTISE, brief.team_expertise.as_deref());

        if role > AgentRole::Validator {
            if let Some(validation) = &self.validation_result {
                ctx.insert(keys::VERDICT, validation.verdict.as_str());
                ctx.insert(keys::RATIONALE, validation.rationale.as_str());
            }
        }
        if role > AgentRole::LandingPageWriter {
            if let Some(page) = &self.landing_page {
                ctx.insert(keys::LANDING_PAGE, page.as_str());
            }
        }
        ctx
    }

    /// Merges a node output.
    ///
    /// # Errors
    ///
    /// - [`LaunchpadError::OutputAlreadyWritten`] if the field is already set.
    /// - [`LaunchpadError::OutOfSequence`] if an output it depends on is missing.
    pub fn apply(&mut self, output: NodeOutput) -> Result<(), LaunchpadError> {
        let role = output.role();
        match output {
            NodeOutput::Validation(value) => {
                Self::write_once(&mut self.validation_result, value, "validation_result")
            }
            NodeOutput::LandingPage(value) => {
                if self.validation_result.is_none() {
                    return Err(LaunchpadError::OutOfSequence { agent: role });
                }
                Self::write_once(&mut self.landing_page, value, "landing_page")
            }
            NodeOutput::TechStack(value) => {
                if self.landing_page.is_none() {
                    return Err(LaunchpadError::OutOfSequence { agent: role });
                }
                Self::write_once(&mut self.tech_stack, value, "tech_stack")
            }
        }
    }

    /// Appends a failure record.
    pub fn record_failure(&mut self, failure: NodeFailure) {
        self.errors.push(failure);
    }

    fn write_once<T>(slot: &mut Option<T>, value: T, field: &str) -> Result<(), LaunchpadError> {
        if slot.is_some() {
            return Err(LaunchpadError::OutputAlreadyWritten {
                field: field.to_string(),
            });
        }
        *slot = Some(value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Position of a run in the orchestration state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing has run yet.
    Start,
    /// The Validator succeeded.
    RanValidator,
    /// The LandingPageWriter succeeded.
    RanLandingPage,
    /// The TechStackRecommender succeeded.
    RanTechStack,
    /// Every node succeeded.
    Done,
    /// A node failed; absorbing.
    Failed,
}

impl Stage {
    /// The node to run from this stage, or `None` if no node runs next.
    pub fn next_role(self) -> Option<AgentRole> {
        match self {
            Stage::Start => Some(AgentRole::Validator),
            Stage::RanValidator => Some(AgentRole::LandingPageWriter),
            Stage::RanLandingPage => Some(AgentRole::TechStackRecommender),
            Stage::RanTechStack | Stage::Done | Stage::Failed => None,
        }
    }

    /// The stage reached after `role` succeeds.
    pub fn after_success(role: AgentRole) -> Self {
        match role {
            AgentRole::Validator => Stage::RanValidator,
            AgentRole::LandingPageWriter => Stage::RanLandingPage,
            AgentRole::TechStackRecommender => Stage::RanTechStack,
        }
    }

    /// The terminal tag for this stage, if it is terminal.
    pub fn terminal(self) -> Option<TerminalState> {
        match self {
            Stage::Done => Some(TerminalState::Done),
            Stage::Failed => Some(TerminalState::Failed),
            _ => None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// All three nodes succeeded.
    Done,
    /// The first failure stopped the run.
    Failed,
}

impl std::fmt::Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalState::Done => f.write_str("done"),
            TerminalState::Failed => f.write_str("failed"),
        }
    }
}

/// Result of one pipeline run: the final state and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Run identifier.
    pub run_id: PipelineRunId,
    /// Terminal tag.
    pub terminal: TerminalState,
    /// Final state, including any partial artefacts.
    pub state: PipelineState,
    /// Tokens consumed across all model calls of the run.
    pub usage: TokenUsage,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run reached its terminal state.
    pub finished_at: Timestamp,
}

impl PipelineOutcome {
    /// Returns `true` if the run ended in [`TerminalState::Done`].
    pub fn is_done(&self) -> bool {
        self.terminal == TerminalState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailureKind, TechChoice, Verdict};

    fn validation() -> ValidationResult {
        ValidationResult {
            verdict: Verdict::Promising,
            rationale: "Clear pain point.".into(),
        }
    }

    fn page() -> LandingPage {
        LandingPage::parse("# PlantPal\nWater on time.").unwrap()
    }

    fn stack() -> TechStackRecommendation {
        TechStackRecommendation::new(vec![TechChoice {
            category: "Mobile".into(),
            technology: "Flutter".into(),
            rationale: None,
        }])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_blank_idea() {
        assert_eq!(
            PipelineState::new(IdeaBrief::new("  \t ")),
            Err(LaunchpadError::EmptyIdea)
        );
    }

    #[test]
    fn test_new_normalizes_brief() {
        let state = PipelineState::new(
            IdeaBrief::new("  plant app \n")
                .with_budget("   ")
                .with_target_audience(" renters "),
        )
        .unwrap();

        assert_eq!(state.idea(), "plant app");
        assert_eq!(state.brief().budget, None);
        assert_eq!(state.brief().target_audience.as_deref(), Some("renters"));
    }

    #[test]
    fn test_outputs_are_write_once() {
        let mut state = PipelineState::new(IdeaBrief::new("plant app")).unwrap();
        state.apply(NodeOutput::Validation(validation())).unwrap();

        assert_eq!(
            state.apply(NodeOutput::Validation(validation())),
            Err(LaunchpadError::OutputAlreadyWritten {
                field: "validation_result".into()
            })
        );
    }

    #[test]
    fn test_outputs_must_follow_sequence() {
        let mut state = PipelineState::new(IdeaBrief::new("plant app")).unwrap();

        assert_eq!(
            state.apply(NodeOutput::TechStack(stack())),
            Err(LaunchpadError::OutOfSequence {
                agent: AgentRole::TechStackRecommender
            })
        );
        assert_eq!(
            state.apply(NodeOutput::LandingPage(page())),
            Err(LaunchpadError::OutOfSequence {
                agent: AgentRole::LandingPageWriter
            })
        );
        assert!(state.tech_stack().is_none());
        assert!(state.landing_page().is_none());
    }

    #[test]
    fn test_context_only_exposes_preceding_outputs() {
        let mut state = PipelineState::new(IdeaBrief::new("plant app")).unwrap();
        state.apply(NodeOutput::Validation(validation())).unwrap();
        state.apply(NodeOutput::LandingPage(page())).unwrap();

        let validator = state.context_for(AgentRole::Validator);
        assert_eq!(validator.get(keys::IDEA), Some("plant app"));
        assert!(!validator.contains(keys::VERDICT));
        assert!(!validator.contains(keys::LANDING_PAGE));

        let writer = state.context_for(AgentRole::LandingPageWriter);
        assert_eq!(writer.get(keys::VERDICT), Some("promising"));
        assert!(!writer.contains(keys::LANDING_PAGE));

        let advisor = state.context_for(AgentRole::TechStackRecommender);
        assert_eq!(advisor.get(keys::VERDICT), Some("promising"));
        assert_eq!(
            advisor.get(keys::LANDING_PAGE),
            Some("# PlantPal\nWater on time.")
        );
    }

    #[test]
    fn test_errors_are_appended_in_order() {
        let mut state = PipelineState::new(IdeaBrief::new("plant app")).unwrap();
        for kind in [FailureKind::RateLimited, FailureKind::Timeout] {
            state.record_failure(NodeFailure {
                agent: AgentRole::Validator,
                kind,
                message: String::new(),
                attempts: 1,
            });
        }
        let kinds: Vec<_> = state.errors().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![FailureKind::RateLimited, FailureKind::Timeout]);
    }

    #[test]
    fn test_stage_walk() {
        let mut stage = Stage::Start;
        let mut ran = Vec::new();
        while let Some(role) = stage.next_role() {
            ran.push(role);
            stage = Stage::after_success(role);
        }
        assert_eq!(ran, AgentRole::SEQUENCE.to_vec());
        assert_eq!(stage, Stage::RanTechStack);
        assert_eq!(stage.terminal(), None);
        assert_eq!(Stage::Failed.next_role(), None);
        assert_eq!(Stage::Failed.terminal(), Some(TerminalState::Failed));
    }
}
