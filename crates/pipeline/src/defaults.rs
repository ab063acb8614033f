//! Built-in default agent configurations.
//!
//! Used whenever the configuration provider is absent, unreachable, slow, or
//! answers with something unusable. Each default asks the model for exactly
//! the output shape its role parses (see [`crate::output`]).

use crate::{AgentRole, GenerationParameters};

/// Model used by every built-in default.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

const VALIDATOR_TEMPLATE: &str = "\
You are a pragmatic startup idea validator. Assess the idea below for market \
demand, competition, and feasibility for a small team.

Idea: {{ idea }}
Target audience: {{ target_audience }}
Problem statement: {{ problem_statement }}

Begin your answer with a single line of the form
Verdict: promising | needs-work | not-viable
choosing exactly one value, then explain your reasoning.";

const LANDING_PAGE_TEMPLATE: &str = "\
You are a conversion-focused copywriter. Write landing-page copy in markdown \
for the product below: a headline that names the product, a subheadline, three \
benefit bullets, and a call to action.

Idea: {{ idea }}
Target audience: {{ target_audience }}
Unique value proposition: {{ unique_value_prop }}
Validator verdict: {{ verdict }}
Validator notes: {{ rationale }}";

const TECH_STACK_TEMPLATE: &str = "\
You are a senior software architect. Recommend a tech stack for the product \
below that fits the team, the expected load, and the budget.

Idea: {{ idea }}
Expected users: {{ expected_users }}
Budget: {{ budget }}
Team expertise: {{ team_expertise }}
Validator verdict: {{ verdict }}

Landing page:
{{ landing_page }}

Answer with one bullet per layer in the form
- Category: Technology; short rationale";

/// Default prompt template for `role`.
pub fn default_template(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Validator => VALIDATOR_TEMPLATE,
        AgentRole::LandingPageWriter => LANDING_PAGE_TEMPLATE,
        AgentRole::TechStackRecommender => TECH_STACK_TEMPLATE,
    }
}

/// Default generation options for `role`.
pub fn default_parameters(role: AgentRole) -> GenerationParameters {
    let (temperature, max_tokens) = match role {
        AgentRole::Validator => (0.3, 1024),
        AgentRole::LandingPageWriter => (0.7, 2048),
        AgentRole::TechStackRecommender => (0.2, 1024),
    };
    GenerationParameters::new()
        .with(GenerationParameters::TEMPERATURE, temperature)
        .with(GenerationParameters::MAX_TOKENS, max_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::keys;
    use crate::{render_template, AgentConfig, IdeaBrief, PipelineState, ResolutionContext};

    fn template_keys(template: &str) -> Vec<String> {
        let env = minijinja::Environment::new();
        let compiled = env.template_from_str(template).unwrap();
        let mut keys: Vec<String> = compiled.undeclared_variables(false).into_iter().collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_fallback_config_for_every_role() {
        for role in AgentRole::SEQUENCE {
            let config = AgentConfig::fallback(role);
            assert_eq!(config.agent_id(), &role.agent_id());
            assert_eq!(config.model().as_str(), DEFAULT_MODEL);
            assert!(config.is_fallback());
            assert!(config.parameters().max_tokens().is_some());
        }
    }

    #[test]
    fn test_default_templates_only_use_visible_keys() {
        let brief = IdeaBrief::new("plant app")
            .with_target_audience("a")
            .with_problem_statement("b")
            .with_unique_value_prop("c")
            .with_expected_users("d")
            .with_budget("e")
            .with_team_expertise("f");
        let state = PipelineState::new(brief).unwrap();

        for role in AgentRole::SEQUENCE {
            let mut visible = state.context_for(role);
            if role > AgentRole::Validator {
                visible.insert(keys::VERDICT, "promising");
                visible.insert(keys::RATIONALE, "r");
            }
            if role > AgentRole::LandingPageWriter {
                visible.insert(keys::LANDING_PAGE, "p");
            }
            let used = template_keys(default_template(role));
            assert!(used.iter().any(|key| key == keys::IDEA));
            for key in used {
                assert!(visible.contains(&key), "{role} template uses hidden key {key}");
            }
        }
    }

    #[test]
    fn test_default_templates_render_without_any_context() {
        for role in AgentRole::SEQUENCE {
            let rendered = render_template(default_template(role), &ResolutionContext::default());
            assert!(rendered.is_ok(), "{role} default template must render");
        }
    }
}
