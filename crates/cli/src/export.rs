//! Writes a run's artefacts as markdown files plus `run.json`.
//!
//! Layout: `<output>/<slug>-<YYYYMMDD-HHMM>/`
//!
//! | File | Written when |
//! |------|--------------|
//! | `00-summary.md` | always |
//! | `01-idea-validation.md` | the Validator succeeded |
//! | `02-landing-page.md` | the LandingPageWriter succeeded |
//! | `03-tech-stack.md` | the TechStackRecommender succeeded |
//! | `run.json` | always |

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pipeline::{PipelineOutcome, OUTPUT_CONTRACT_VERSION};

const SLUG_MAX_CHARS: usize = 30;

/// Writes every artefact of `outcome` under `output_root` and returns the run folder.
pub fn write_run(output_root: &Path, outcome: &PipelineOutcome) -> Result<PathBuf> {
    let started = outcome.started_at.as_datetime();
    let folder = format!(
        "{}-{}",
        slug(outcome.state.idea()),
        started.format("%Y%m%d-%H%M")
    );
    let dir = output_root.join(folder);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    write(&dir, "00-summary.md", &summary(outcome))?;

    let state = &outcome.state;
    if let Some(validation) = state.validation_result() {
        write(
            &dir,
            "01-idea-validation.md",
            &format!(
                "# Idea Validation\n\n**Verdict:** {}\n\n{}\n",
                validation.verdict, validation.rationale
            ),
        )?;
    }
    if let Some(page) = state.landing_page() {
        write(&dir, "02-landing-page.md", &format!("# Landing Page Copy\n\n{page}\n"))?;
    }
    if let Some(stack) = state.tech_stack() {
        write(
            &dir,
            "03-tech-stack.md",
            &format!("# Tech Stack Recommendation\n\n{}", stack.to_markdown()),
        )?;
    }

    let json = serde_json::to_string_pretty(outcome).context("serialising run outcome")?;
    write(&dir, "run.json", &json)?;

    Ok(dir)
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))
}

/// Folder-safe prefix of the idea: lowercase, dashes for spaces, alphanumerics only.
pub fn slug(idea: &str) -> String {
    let slug: String = idea
        .to_lowercase()
        .chars()
        .take(SLUG_MAX_CHARS)
        .map(|c| if c == ' ' || c == '/' { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();
    if slug.is_empty() {
        "idea".to_string()
    } else {
        slug
    }
}

fn summary(outcome: &PipelineOutcome) -> String {
    let brief = outcome.state.brief();
    let detail = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "# Side Project Summary\n");
    let _ = writeln!(out, "## Idea\n{}\n", brief.idea);
    let _ = writeln!(out, "## Target Audience\n{}\n", detail(&brief.target_audience));
    let _ = writeln!(out, "## Problem Statement\n{}\n", detail(&brief.problem_statement));
    let _ = writeln!(
        out,
        "## Unique Value Proposition\n{}\n",
        detail(&brief.unique_value_prop)
    );
    let _ = writeln!(out, "## Technical Requirements");
    let _ = writeln!(out, "- Expected Users: {}", detail(&brief.expected_users));
    let _ = writeln!(out, "- Budget: {}", detail(&brief.budget));
    let _ = writeln!(out, "- Team Expertise: {}\n", detail(&brief.team_expertise));

    let _ = writeln!(out, "## Run");
    let _ = writeln!(out, "- Run ID: {}", outcome.run_id);
    let _ = writeln!(out, "- Result: {}", outcome.terminal);
    if let Some(validation) = outcome.state.validation_result() {
        let _ = writeln!(out, "- Verdict: {}", validation.verdict);
    }
    if let Some(page) = outcome.state.landing_page() {
        let _ = writeln!(out, "- Headline: {}", page.headline());
    }
    let _ = writeln!(
        out,
        "- Tokens: {} in / {} out",
        outcome.usage.input.as_u64(),
        outcome.usage.output.as_u64()
    );
    let _ = writeln!(out, "- Output contract: v{OUTPUT_CONTRACT_VERSION}");
    for failure in outcome.state.errors() {
        let _ = writeln!(out, "- Error: {failure}");
    }

    let _ = writeln!(
        out,
        "\n---\nGenerated: {}",
        outcome.finished_at.as_datetime().format("%Y-%m-%d %H:%M")
    );
    out
}
