//! Interactive collection of the idea brief.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use pipeline::IdeaBrief;

/// Asks for the idea and every detail not already set.
///
/// An empty answer leaves the field unset. End of input stops asking.
pub fn complete_brief<R: BufRead, W: Write>(
    mut brief: IdeaBrief,
    input: &mut R,
    output: &mut W,
) -> Result<IdeaBrief> {
    if brief.idea.trim().is_empty() {
        let question = "What's your idea? (e.g., AI-powered recipe app)";
        if let Some(answer) = ask(input, output, question)? {
            brief.idea = answer;
        }
    }

    let questions: [(&str, &mut Option<String>); 6] = [
        (
            "Who is your target audience? (e.g., busy parents)",
            &mut brief.target_audience,
        ),
        (
            "What problem does it solve? (e.g., no time to plan meals)",
            &mut brief.problem_statement,
        ),
        (
            "What's your unique value proposition? (e.g., snap a photo, get dinner)",
            &mut brief.unique_value_prop,
        ),
        (
            "Expected users? (e.g., 10,000 monthly active users)",
            &mut brief.expected_users,
        ),
        (
            "Monthly budget for infrastructure? (e.g., $500/month)",
            &mut brief.budget,
        ),
        (
            "Team's tech expertise? (e.g., Python, React, AWS)",
            &mut brief.team_expertise,
        ),
    ];

    for (question, slot) in questions {
        if slot.is_some() {
            continue;
        }
        if let Some(answer) = ask(input, output, question)? {
            *slot = Some(answer);
        }
    }

    Ok(brief)
}

/// Prints `question` and reads one trimmed line. `None` for blank or EOF.
fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<Option<String>> {
    write!(output, "\n{question}\n> ").context("writing prompt")?;
    output.flush().context("flushing prompt")?;

    let mut line = String::new();
    input.read_line(&mut line).context("reading answer")?;
    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_asks_only_for_missing_fields() {
        let brief = IdeaBrief::new("").with_budget("$20/month");
        let mut input =
            Cursor::new("plant app\nrenters\n\nreminders that adapt\n100 users\nRust\n");
        let mut output = Vec::new();

        let brief = complete_brief(brief, &mut input, &mut output).unwrap();

        assert_eq!(brief.idea, "plant app");
        assert_eq!(brief.target_audience.as_deref(), Some("renters"));
        assert_eq!(brief.problem_statement, None);
        assert_eq!(brief.unique_value_prop.as_deref(), Some("reminders that adapt"));
        assert_eq!(brief.expected_users.as_deref(), Some("100 users"));
        assert_eq!(brief.budget.as_deref(), Some("$20/month"));
        assert_eq!(brief.team_expertise.as_deref(), Some("Rust"));

        let transcript = String::from_utf8(output).unwrap();
        assert!(!transcript.contains("Monthly budget"));
    }

    #[test]
    fn test_end_of_input_leaves_fields_unset() {
        let mut input = Cursor::new("");
        let brief =
            complete_brief(IdeaBrief::new("plant app"), &mut input, &mut Vec::new()).unwrap();
        assert_eq!(brief, IdeaBrief::new("plant app"));
    }
}
