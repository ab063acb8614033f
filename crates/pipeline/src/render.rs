//! Prompt template rendering.
//!
//! Templates are minijinja templates; in practice they use `{{ key }}`
//! placeholders, the same syntax the configuration provider uses for its
//! template variables. Rendering is a pure function of the template and the
//! context: no clock, no randomness, no I/O.
//!
//! Undefined keys render as the empty string. Substituted values are emitted
//! as-is and never evaluated as template source.

use minijinja::Environment;
use tracing::debug;

use crate::{ResolutionContext, TemplateError};

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env
}

/// Checks that `template` compiles.
///
/// # Errors
///
/// Returns a [`TemplateError`] describing the syntax problem.
pub fn check_template(template: &str) -> Result<(), TemplateError> {
    let env = environment();
    env.template_from_str(template)
        .map(|_| ())
        .map_err(TemplateError::from)
}

/// Renders `template` with the variables of `context`.
///
/// # Errors
///
/// Returns a [`TemplateError`] if the template does not compile or fails while
/// rendering (for example an attribute lookup on an undefined value).
pub fn render_template(
    template: &str,
    context: &ResolutionContext,
) -> Result<String, TemplateError> {
    let env = environment();
    let compiled = env.template_from_str(template)?;
    for key in compiled.undeclared_variables(false) {
        if !context.contains(&key) {
            debug!(placeholder = %key, "Template placeholder has no value");
        }
    }
    Ok(compiled.render(context.variables())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::keys;

    fn context() -> ResolutionContext {
        let mut ctx = ResolutionContext::new(None);
        ctx.insert(keys::IDEA, "AI-powered plant watering reminder app");
        ctx.insert(keys::VERDICT, "promising");
        ctx
    }

    #[test]
    fn test_render_substitutes_known_keys() {
        let rendered = render_template("Idea: {{idea}} ({{ verdict }})", &context()).unwrap();
        assert_eq!(
            rendered,
            "Idea: AI-powered plant watering reminder app (promising)"
        );
    }

    #[test]
    fn test_render_unknown_key_is_empty() {
        assert_eq!(render_template("[{{budget}}]", &context()).unwrap(), "[]");
    }

    #[test]
    fn test_render_keeps_trailing_newline() {
        assert_eq!(
            render_template("{{ verdict }}\n", &context()).unwrap(),
            "promising\n"
        );
    }

    #[test]
    fn test_unterminated_placeholder_is_a_template_error() {
        assert!(render_template("{{idea}} and {{ oops", &context()).is_err());
        assert!(check_template("{{idea}} and {{ oops").is_err());
        assert!(check_template("{% if %}").is_err());
        assert_eq!(check_template("Idea: {{ idea }}"), Ok(()));
    }

    #[test]
    fn test_attribute_of_undefined_fails_at_render_time() {
        let template = "{{ budget.monthly.limit }}";
        assert_eq!(check_template(template), Ok(()));
        assert!(render_template(template, &context()).is_err());
    }

    #[test]
    fn test_render_does_not_rescan_substituted_values() {
        let mut ctx = ResolutionContext::new(None);
        ctx.insert(keys::IDEA, "{{verdict}}");
        ctx.insert(keys::VERDICT, "promising");
        assert_eq!(render_template("{{idea}}", &ctx).unwrap(), "{{verdict}}");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = "Validate {{ idea }} for {{target_audience}}. Verdict so far: {{verdict}}";
        let ctx = context();
        let first = render_template(template, &ctx).unwrap();
        for _ in 0..10 {
            assert_eq!(
                render_template(template, &ctx).unwrap().as_bytes(),
                first.as_bytes()
            );
        }
    }
}
