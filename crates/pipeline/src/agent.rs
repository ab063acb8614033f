//! Agent roles, resolved agent configuration, and the resolution context.
//!
//! The pipeline has a closed set of three agents. Each [`AgentRole`] knows its
//! configuration key, its place in the sequence, and the fixed user-turn
//! instruction sent alongside its rendered prompt. Everything else about an
//! agent's behaviour (model, prompt template, generation parameters) arrives
//! at run time as an [`AgentConfig`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{defaults, AgentId, GenerationParameters, ModelId, ProvenanceToken, UserKey};

// ---------------------------------------------------------------------------
// Context keys
// ---------------------------------------------------------------------------

/// Names of the variables a node exposes to its prompt template.
pub mod keys {
    /// The raw idea text.
    pub const IDEA: &str = "idea";
    /// Who the product is for.
    pub const TARGET_AUDIENCE: &str = "target_audience";
    /// The problem the product solves.
    pub const PROBLEM_STATEMENT: &str = "problem_statement";
    /// One-line unique value proposition.
    pub const UNIQUE_VALUE_PROP: &str = "unique_value_prop";
    /// Expected user volume.
    pub const EXPECTED_USERS: &str = "expected_users";
    /// Infrastructure budget.
    pub const BUDGET: &str = "budget";
    /// Skills of the team building it.
    pub const TEAM_EXPERTISE: &str = "team_expertise";
    /// Validator verdict (`promising`, `needs-work`, `not-viable`).
    pub const VERDICT: &str = "verdict";
    /// Validator rationale.
    pub const RATIONALE: &str = "rationale";
    /// Landing-page copy.
    pub const LANDING_PAGE: &str = "landing_page";
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// One of the three pipeline agents.
///
/// Variants are declared in execution order; [`AgentRole::SEQUENCE`] is the
/// only order in which they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentRole {
    /// Judges whether the idea is worth pursuing.
    #[serde(rename = "idea-validator")]
    Validator,
    /// Drafts landing-page copy for the idea.
    #[serde(rename = "landing-page-writer")]
    LandingPageWriter,
    /// Recommends technologies to build the idea with.
    #[serde(rename = "tech-stack-advisor")]
    TechStackRecommender,
}

impl AgentRole {
    /// All roles in execution order.
    pub const SEQUENCE: [AgentRole; 3] = [
        AgentRole::Validator,
        AgentRole::LandingPageWriter,
        AgentRole::TechStackRecommender,
    ];

    /// The configuration key for this role at the configuration provider.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Validator => "idea-validator",
            AgentRole::LandingPageWriter => "landing-page-writer",
            AgentRole::TechStackRecommender => "tech-stack-advisor",
        }
    }

    /// The configuration key as an [`AgentId`].
    pub fn agent_id(self) -> AgentId {
        AgentId::from_static(self.as_str())
    }

    /// The user-turn message sent together with the rendered prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            AgentRole::Validator => "Please validate this idea and provide your analysis.",
            AgentRole::LandingPageWriter => "Please write the landing page copy.",
            AgentRole::TechStackRecommender => "Please recommend a tech stack.",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Configuration resolved for one node invocation.
///
/// Immutable once built; a fresh value is resolved for every node run and
/// dropped when the node finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    agent_id: AgentId,
    model: ModelId,
    prompt_template: String,
    parameters: GenerationParameters,
    provenance: ProvenanceToken,
}

impl AgentConfig {
    /// Builds a configuration, returning `None` if the template is blank.
    pub fn new(
        agent_id: AgentId,
        model: ModelId,
        prompt_template: impl Into<String>,
        parameters: GenerationParameters,
        provenance: ProvenanceToken,
    ) -> Option<Self> {
        let prompt_template = prompt_template.into();
        if prompt_template.trim().is_empty() {
            return None;
        }
        Some(Self {
            agent_id,
            model,
            prompt_template,
            parameters,
            provenance,
        })
    }

    /// The built-in default configuration for `role`, tagged with the
    /// fallback provenance token.
    pub fn fallback(role: AgentRole) -> Self {
        Self {
            agent_id: role.agent_id(),
            model: ModelId::from_static(defaults::DEFAULT_MODEL),
            prompt_template: defaults::default_template(role).to_string(),
            parameters: defaults::default_parameters(role),
            provenance: ProvenanceToken::fallback(),
        }
    }

    /// Configuration key this configuration was resolved for.
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Model to call.
    pub fn model(&self) -> &ModelId {
        &self.model
    }

    /// Prompt template with `{{ key }}` placeholders.
    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    /// Generation options forwarded to the model.
    pub fn parameters(&self) -> &GenerationParameters {
        &self.parameters
    }

    /// Which configuration variant was served.
    pub fn provenance(&self) -> &ProvenanceToken {
        &self.provenance
    }

    /// Returns `true` if this is a built-in default rather than a provider answer.
    pub fn is_fallback(&self) -> bool {
        self.provenance.is_fallback()
    }
}

// ---------------------------------------------------------------------------
// Resolution context
// ---------------------------------------------------------------------------

/// Variables visible to one node, plus the targeting key.
///
/// Passed to the configuration provider (for targeting and template variables)
/// and used to render the prompt template. Variables are ordered so that two
/// contexts built from the same state compare and serialise identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionContext {
    user_key: Option<UserKey>,
    variables: BTreeMap<String, String>,
}

impl ResolutionContext {
    /// Creates an empty context.
    pub fn new(user_key: Option<UserKey>) -> Self {
        Self {
            user_key,
            variables: BTreeMap::new(),
        }
    }

    /// Sets a variable, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Sets a variable when a value is present.
    pub fn insert_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Returns the value of a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Returns `true` if the variable is set.
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Targeting key for variant assignment.
    pub fn user_key(&self) -> Option<&UserKey> {
        self.user_key.as_ref()
    }

    /// All variables in key order.
    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }
}
