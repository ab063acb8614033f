//! Structured node outputs and the role-specific parsing of model answers.
//!
//! The shapes in this module form a versioned contract
//! ([`OUTPUT_CONTRACT_VERSION`]): downstream consumers and tests branch on the
//! [`Verdict`] taxonomy and the [`TechChoice`] fields, so changing either is a
//! breaking change that must bump the version.
//!
//! Parsing is deliberately lenient about formatting (markdown emphasis, code
//! fences, letter case) and strict about structure: a validator answer without
//! a verdict, or a tech-stack answer without a single choice, is rejected with
//! a [`ParseError`].

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Version of the output shapes defined in this module.
pub const OUTPUT_CONTRACT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Validator verdict on an idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// Worth building as described.
    Promising,
    /// Viable only after the issues in the rationale are addressed.
    NeedsWork,
    /// Not worth pursuing.
    NotViable,
}

impl Verdict {
    /// All verdicts, strongest first.
    pub const ALL: [Verdict; 3] = [Verdict::Promising, Verdict::NeedsWork, Verdict::NotViable];

    /// Wire name of the verdict.
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Promising => "promising",
            Verdict::NeedsWork => "needs-work",
            Verdict::NotViable => "not-viable",
        }
    }

    /// Splits a verdict off the start of `value` and returns it with the
    /// remaining text, stripped of leading separators.
    fn split_prefix(value: &str) -> Option<(Self, &str)> {
        let value = value.trim();
        let verdict = Self::match_prefix(value)?;
        let rest = value.get(verdict.as_str().len()..).unwrap_or_default();
        let rest = rest.trim_start_matches(|c: char| {
            c.is_whitespace()
                || matches!(c, '-' | '\u{2013}' | '\u{2014}' | ':' | '.' | ',' | ';' | '*')
        });
        Some((verdict, rest.trim_end()))
    }

    /// Matches a verdict at the start of `value`, ignoring case and accepting
    /// spaces or underscores in place of hyphens.
    fn match_prefix(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '_' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        Self::ALL.into_iter().find(|verdict| {
            normalized
                .strip_prefix(verdict.as_str())
                .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_alphanumeric()))
        })
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verdict {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::match_prefix(s) {
            Some(verdict) if s.trim().len() == verdict.as_str().len() => Ok(verdict),
            _ => Err(ParseError::UnknownVerdict(s.trim().to_string())),
        }
    }
}

/// Output of the Validator node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The verdict.
    pub verdict: Verdict,
    /// Why the validator reached it.
    pub rationale: String,
}

#[derive(Deserialize)]
struct RawValidation {
    verdict: String,
    #[serde(default)]
    rationale: String,
}

impl ValidationResult {
    /// Parses a validator answer.
    ///
    /// Accepts a JSON object `{"verdict": ..., "rationale": ...}` or text with a
    /// `Verdict: <value>` line. In the text form the rationale is any text
    /// following the verdict on that line plus every other line.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let body = strip_code_fence(text);
        if body.starts_with('{') {
            let raw: RawValidation =
                serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
            let verdict = raw.verdict.parse()?;
            return Self::with_rationale(verdict, raw.rationale.trim());
        }

        let mut verdict = None;
        let mut rationale = Vec::new();
        for line in body.lines() {
            if verdict.is_none() {
                if let Some(value) = verdict_line_value(line) {
                    let (found, trailing) = Verdict::split_prefix(value)
                        .ok_or_else(|| ParseError::UnknownVerdict(value.to_string()))?;
                    verdict = Some(found);
                    if !trailing.is_empty() {
                        rationale.push(trailing);
                    }
                    continue;
                }
            }
            rationale.push(line);
        }

        let verdict = verdict.ok_or(ParseError::MissingVerdict)?;
        Self::with_rationale(verdict, rationale.join("\n").trim())
    }

    fn with_rationale(verdict: Verdict, rationale: &str) -> Result<Self, ParseError> {
        if rationale.is_empty() {
            return Err(ParseError::EmptyRationale);
        }
        Ok(Self {
            verdict,
            rationale: rationale.to_string(),
        })
    }
}

/// Returns the text after `Verdict:` if `line` is a verdict line.
fn verdict_line_value(line: &str) -> Option<&str> {
    let line = line.trim_start_matches(|c: char| c.is_whitespace() || "#*->".contains(c));
    let head = line.get(..7)?;
    if !head.eq_ignore_ascii_case("verdict") {
        return None;
    }
    let rest = line[7..].trim_start_matches(|c: char| c == '*' || c.is_whitespace());
    let value = rest.strip_prefix(':')?;
    Some(value.trim().trim_matches('*').trim())
}

// ---------------------------------------------------------------------------
// Landing page
// ---------------------------------------------------------------------------

/// Output of the LandingPageWriter node: freeform markdown copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandingPage(String);

impl LandingPage {
    /// Parses a landing-page answer, rejecting text that is only markdown
    /// punctuation.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text
            .chars()
            .all(|c| c.is_whitespace() || "#*-_>=`".contains(c))
        {
            return Err(ParseError::EmptyLandingPage);
        }
        Ok(Self(text.to_string()))
    }

    /// The full copy.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First line with content, stripped of heading markers.
    pub fn headline(&self) -> &str {
        self.0
            .lines()
            .map(|line| line.trim().trim_start_matches('#').trim())
            .find(|line| !line.is_empty())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for LandingPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tech stack
// ---------------------------------------------------------------------------

/// One recommended technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechChoice {
    /// Layer or concern (e.g. `"Backend"`, `"Database"`).
    pub category: String,
    /// The recommended technology.
    pub technology: String,
    /// Why it was chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Output of the TechStackRecommender node: an ordered, non-empty list of choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStackRecommendation {
    choices: Vec<TechChoice>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTechStack {
    List(Vec<TechChoice>),
    Wrapped { choices: Vec<TechChoice> },
}

impl TechStackRecommendation {
    /// Builds a recommendation, rejecting an empty list or blank entries.
    pub fn new(choices: Vec<TechChoice>) -> Result<Self, ParseError> {
        let valid = choices
            .iter()
            .all(|c| !c.category.trim().is_empty() && !c.technology.trim().is_empty());
        if choices.is_empty() || !valid {
            return Err(ParseError::NoTechChoices);
        }
        Ok(Self { choices })
    }

    /// Parses a tech-stack answer.
    ///
    /// Accepts a JSON array of choices (optionally wrapped as `{"choices": [...]}`)
    /// or list lines `- Category: Technology; rationale`, where the marker may
    /// also be `*`, `+`, `1.` or `1)`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let body = strip_code_fence(text);
        if body.starts_with('[') || body.starts_with('{') {
            let raw: RawTechStack =
                serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
            let choices = match raw {
                RawTechStack::List(choices) | RawTechStack::Wrapped { choices } => choices,
            };
            return Self::new(choices);
        }

        let choices = body.lines().filter_map(bullet_choice).collect();
        Self::new(choices)
    }

    /// The choices in recommendation order.
    pub fn choices(&self) -> &[TechChoice] {
        &self.choices
    }

    /// Number of choices (always at least one).
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Renders the choices as bullet lines in the accepted text format.
    pub fn to_markdown(&self) -> String {
        self.choices
            .iter()
            .map(|c| match &c.rationale {
                Some(why) => format!("- {}: {}; {}", c.category, c.technology, why),
                None => format!("- {}: {}", c.category, c.technology),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Strips a `-`, `*`, `+`, `N.` or `N)` list marker.
fn list_item(line: &str) -> Option<&str> {
    let bullet = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "));
    if bullet.is_some() {
        return bullet;
    }
    let number = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if number.len() == line.len() {
        return None;
    }
    number
        .strip_prefix(". ")
        .or_else(|| number.strip_prefix(") "))
}

fn bullet_choice(line: &str) -> Option<TechChoice> {
    let item = list_item(line.trim())?;
    let item = item.replace("**", "");
    let (category, rest) = item.split_once(':')?;
    let (technology, rationale) = match rest.split_once(';') {
        Some((tech, why)) => (tech, Some(why.trim()).filter(|w| !w.is_empty())),
        None => (rest, None),
    };
    let category = category.trim();
    let technology = technology.trim();
    if category.is_empty() || technology.is_empty() {
        return None;
    }
    Some(TechChoice {
        category: category.to_string(),
        technology: technology.to_string(),
        rationale: rationale.map(str::to_string),
    })
}

/// Strips surrounding whitespace and a single markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    match inner.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_str_accepts_variants() {
        assert_eq!("promising".parse::<Verdict>(), Ok(Verdict::Promising));
        assert_eq!("Needs Work".parse::<Verdict>(), Ok(Verdict::NeedsWork));
        assert_eq!("NOT_VIABLE".parse::<Verdict>(), Ok(Verdict::NotViable));
        assert_eq!(
            "maybe".parse::<Verdict>(),
            Err(ParseError::UnknownVerdict("maybe".into()))
        );
        assert!("promisingly".parse::<Verdict>().is_err());
    }

    #[test]
    fn test_validation_from_verdict_line() {
        let text =
            "## Analysis\n**Verdict:** Promising\n\nStrong demand among renters with houseplants.";
        let result = ValidationResult::parse(text).unwrap();

        assert_eq!(result.verdict, Verdict::Promising);
        assert_eq!(
            result.rationale,
            "## Analysis\n\nStrong demand among renters with houseplants."
        );
    }

    #[test]
    fn test_validation_keeps_text_after_verdict_on_same_line() {
        let line = "Verdict: promising - renters with houseplants forget to water.";
        let result = ValidationResult::parse(line).unwrap();
        assert_eq!(result.verdict, Verdict::Promising);
        assert_eq!(result.rationale, "renters with houseplants forget to water.");

        let result =
            ValidationResult::parse("Verdict: needs-work because retention is hard\nSecond line.")
                .unwrap();
        assert_eq!(result.verdict, Verdict::NeedsWork);
        assert_eq!(result.rationale, "because retention is hard\nSecond line.");

        let line = "**Verdict:** Not viable. Nobody pays for this.";
        let result = ValidationResult::parse(line).unwrap();
        assert_eq!(result.verdict, Verdict::NotViable);
        assert_eq!(result.rationale, "Nobody pays for this.");
    }

    #[test]
    fn test_validation_from_json_in_code_fence() {
        let text =
            "```json\n{\"verdict\": \"needs-work\", \"rationale\": \"Crowded market.\"}\n```";
        let result = ValidationResult::parse(text).unwrap();

        assert_eq!(result.verdict, Verdict::NeedsWork);
        assert_eq!(result.rationale, "Crowded market.");
    }

    #[test]
    fn test_validation_rejects_missing_or_unknown_verdict() {
        assert_eq!(
            ValidationResult::parse("Looks great to me!"),
            Err(ParseError::MissingVerdict)
        );
        assert_eq!(
            ValidationResult::parse("Verdict: excellent\nGood idea."),
            Err(ParseError::UnknownVerdict("excellent".into()))
        );
        assert_eq!(
            ValidationResult::parse("Verdict: not viable"),
            Err(ParseError::EmptyRationale)
        );
    }

    #[test]
    fn test_landing_page_rejects_punctuation_only() {
        assert_eq!(LandingPage::parse("# \n---\n***"), Err(ParseError::EmptyLandingPage));
    }

    #[test]
    fn test_landing_page_headline() {
        let page = LandingPage::parse("\n# PlantPal\nNever forget to water again.").unwrap();
        assert_eq!(page.headline(), "PlantPal");
        assert!(page.as_str().starts_with("# PlantPal"));
    }

    #[test]
    fn test_tech_stack_from_bullets() {
        let text = "Here is my recommendation:\n\
                    - **Frontend**: React Native; one codebase for iOS and Android\n\
                    - Backend: FastAPI\n\
                    * Database: PostgreSQL; relational reminders\n\
                    - no colon here";
        let stack = TechStackRecommendation::parse(text).unwrap();

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.choices()[0].category, "Frontend");
        assert_eq!(stack.choices()[0].technology, "React Native");
        assert_eq!(
            stack.choices()[0].rationale.as_deref(),
            Some("one codebase for iOS and Android")
        );
        assert_eq!(stack.choices()[1].rationale, None);
    }

    #[test]
    fn test_tech_stack_from_numbered_list() {
        let text =
            "1. Backend: Axum; async and typed\n2) Database: PostgreSQL\n2026. was a good year";
        let stack = TechStackRecommendation::parse(text).unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.choices()[0].category, "Backend");
        assert_eq!(stack.choices()[0].technology, "Axum");
        assert_eq!(stack.choices()[1].technology, "PostgreSQL");
    }

    #[test]
    fn test_tech_stack_from_wrapped_json() {
        let text = r#"{"choices": [{"category": "Hosting", "technology": "Fly.io"}]}"#;
        let stack = TechStackRecommendation::parse(text).unwrap();
        assert_eq!(stack.choices()[0].technology, "Fly.io");
        assert_eq!(stack.to_markdown(), "- Hosting: Fly.io");
    }

    #[test]
    fn test_tech_stack_rejects_empty() {
        assert_eq!(
            TechStackRecommendation::parse("Use whatever you like."),
            Err(ParseError::NoTechChoices)
        );
        assert_eq!(TechStackRecommendation::parse("[]"), Err(ParseError::NoTechChoices));
        assert!(matches!(
            TechStackRecommendation::parse("[1, 2]"),
            Err(ParseError::InvalidJson(_))
        ));
    }
}
