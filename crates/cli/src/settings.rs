//! Command-line arguments and the validated settings derived from them.
//!
//! Every flag has an environment fallback; `main` loads `.env` before
//! parsing, so values may come from the command line, the environment, or a
//! `.env` file, in that order of precedence.

use std::path::PathBuf;
use std::time::Duration;

use ai_config::AiConfigSettings;
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use nodes::BackoffPolicy;
use pipeline::{IdeaBrief, UserKey};
use secrecy::SecretString;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human-readable records.
    Compact,
    /// Multi-line human-readable records.
    Pretty,
    /// One JSON object per record.
    Json,
}

/// Run a startup idea through validation, landing-page copy, and tech-stack advice.
#[derive(Parser)]
#[command(name = "launchpad", version, about)]
pub struct Args {
    /// The startup idea to evaluate.
    #[arg(value_name = "IDEA")]
    pub idea: Option<String>,

    /// Who the product is for.
    #[arg(long)]
    pub target_audience: Option<String>,

    /// The problem the product solves.
    #[arg(long)]
    pub problem_statement: Option<String>,

    /// One-line unique value proposition.
    #[arg(long)]
    pub unique_value_prop: Option<String>,

    /// Expected user volume (e.g. "10,000 monthly active users").
    #[arg(long)]
    pub expected_users: Option<String>,

    /// Monthly infrastructure budget.
    #[arg(long)]
    pub budget: Option<String>,

    /// Technologies the team already knows.
    #[arg(long)]
    pub team_expertise: Option<String>,

    /// Ask for the idea and any missing details on stdin.
    #[arg(short, long)]
    pub interactive: bool,

    /// Targeting key for configuration variant assignment.
    #[arg(long, env = "LAUNCHPAD_USER_KEY")]
    pub user_key: Option<String>,

    /// Anthropic API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: String,

    /// Anthropic API root.
    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = llm::DEFAULT_BASE_URL)]
    pub anthropic_base_url: String,

    /// AI-config service root. Without it, built-in defaults are used.
    #[arg(long, env = "AI_CONFIG_URL")]
    pub ai_config_url: Option<String>,

    /// AI-config server-side SDK key.
    #[arg(long, env = "AI_CONFIG_SDK_KEY", hide_env_values = true)]
    pub ai_config_sdk_key: Option<String>,

    /// Timeout for one model call, in seconds.
    #[arg(long, env = "LAUNCHPAD_MODEL_TIMEOUT_SECS", default_value_t = 120)]
    pub model_timeout_secs: u64,

    /// Timeout for one configuration lookup, in milliseconds.
    #[arg(long, env = "LAUNCHPAD_CONFIG_TIMEOUT_MS", default_value_t = 5000)]
    pub config_timeout_ms: u64,

    /// Model calls allowed per node, including the first.
    #[arg(long, env = "LAUNCHPAD_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds; doubled per retry.
    #[arg(long, env = "LAUNCHPAD_RETRY_BASE_MS", default_value_t = 500)]
    pub retry_base_ms: u64,

    /// Directory run folders are written under.
    #[arg(short, long, env = "LAUNCHPAD_OUTPUT_DIR", default_value = "output")]
    pub output: PathBuf,

    /// Log output format.
    #[arg(long, env = "LAUNCHPAD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; enables trace export when set.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

/// Validated settings handed to the composition root.
#[derive(Debug, Clone)]
pub struct Settings {
    pub brief: IdeaBrief,
    pub interactive: bool,
    pub anthropic_api_key: SecretString,
    pub anthropic_base_url: String,
    pub model_timeout: Duration,
    pub ai_config: Option<AiConfigSettings>,
    pub backoff: BackoffPolicy,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Validates `args`.
    ///
    /// # Errors
    ///
    /// - The API key is blank.
    /// - Only one of the AI-config URL and SDK key is set.
    /// - No idea was given and interactive mode is off.
    pub fn from_args(args: Args) -> Result<Self> {
        if args.anthropic_api_key.trim().is_empty() {
            bail!("ANTHROPIC_API_KEY is empty");
        }
        if args.idea.is_none() && !args.interactive {
            bail!("no idea given; pass it as an argument or use --interactive");
        }

        let ai_config = match (args.ai_config_url, args.ai_config_sdk_key) {
            (Some(url), Some(key)) => Some(
                AiConfigSettings::new(url, SecretString::from(key))
                    .with_timeout(Duration::from_millis(args.config_timeout_ms)),
            ),
            (None, None) => None,
            (Some(_), None) => bail!("AI_CONFIG_URL is set but AI_CONFIG_SDK_KEY is missing"),
            (None, Some(_)) => bail!("AI_CONFIG_SDK_KEY is set but AI_CONFIG_URL is missing"),
        };

        let brief = IdeaBrief {
            idea: args.idea.unwrap_or_default(),
            user_key: args.user_key.and_then(UserKey::new),
            target_audience: args.target_audience,
            problem_statement: args.problem_statement,
            unique_value_prop: args.unique_value_prop,
            expected_users: args.expected_users,
            budget: args.budget,
            team_expertise: args.team_expertise,
        };

        Ok(Self {
            brief,
            interactive: args.interactive,
            anthropic_api_key: SecretString::from(args.anthropic_api_key),
            anthropic_base_url: args.anthropic_base_url,
            model_timeout: Duration::from_secs(args.model_timeout_secs),
            ai_config,
            backoff: BackoffPolicy::new(
                args.max_attempts,
                Duration::from_millis(args.retry_base_ms),
            ),
            output_dir: args.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Settings> {
        let mut argv = vec!["launchpad", "--anthropic-api-key", "sk-test"];
        argv.extend_from_slice(extra);
        Settings::from_args(Args::try_parse_from(argv)?)
    }

    #[test]
    fn test_idea_and_details_become_brief() {
        let settings = parse(&[
            "AI-powered plant watering reminder app",
            "--target-audience",
            "busy renters",
            "--budget",
            "$50/month",
            "--max-attempts",
            "5",
            "--ai-config-url",
            "http://localhost:8080",
            "--ai-config-sdk-key",
            "sdk-1",
        ])
        .unwrap();

        assert_eq!(settings.brief.idea, "AI-powered plant watering reminder app");
        assert_eq!(settings.brief.target_audience.as_deref(), Some("busy renters"));
        assert_eq!(settings.brief.budget.as_deref(), Some("$50/month"));
        assert_eq!(settings.backoff.max_attempts, 5);
        assert!(settings.ai_config.is_some());
    }

    #[test]
    fn test_missing_idea_requires_interactive() {
        assert!(parse(&[]).is_err());
        let settings = parse(&["--interactive"]).unwrap();
        assert!(settings.interactive);
        assert!(settings.brief.idea.is_empty());
    }

    #[test]
    fn test_half_configured_ai_config_is_rejected() {
        let mut args =
            Args::try_parse_from(["launchpad", "idea", "--anthropic-api-key", "sk"]).unwrap();
        args.ai_config_url = Some("http://localhost:8080".into());
        args.ai_config_sdk_key = None;
        assert!(Settings::from_args(args).is_err());
    }

    #[test]
    fn test_log_format_values() {
        let args = Args::try_parse_from([
            "launchpad",
            "idea",
            "--anthropic-api-key",
            "sk",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let settings = parse(&["idea"]).unwrap();
        assert!(!format!("{settings:?}").contains("sk-test"));
    }
}
