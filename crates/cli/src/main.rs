//! Launchpad CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration**: read `.env`, then parse flags with environment
//!    fallbacks and validate them into [`settings::Settings`].
//! 2. **Wire observability**: configure `tracing-subscriber` and, when an OTLP
//!    endpoint is set, an OpenTelemetry exporter. All spans and structured
//!    events emitted by every crate in the workspace flow through this layer.
//! 3. **Construct infrastructure**: create the `AnthropicProvider` and, when
//!    the AI-config service is configured, the `HttpConfigProvider` and
//!    `HttpEventReporter`, and inject them into `PipelineExecutor`.
//! 4. **Run and export**: run the pipeline once, flush served-variant events,
//!    write the artefacts, and exit non-zero if the run failed.

mod export;
mod prompt;
mod settings;
mod telemetry;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use ai_config::{HttpConfigProvider, HttpEventReporter};
use anyhow::{Context, Result};
use clap::Parser;
use llm::AnthropicProvider;
use nodes::{ConfigResolver, ModelInvoker, NodeServices, PipelineExecutor};
use pipeline::{EventReporter, NoopEventReporter};
use tracing::{info, warn};

use crate::settings::{Args, Settings};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env file is normal; everything can come from the environment.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let telemetry = telemetry::init(args.log_format, args.otlp_endpoint.as_deref())?;

    let result = run(args).await;
    telemetry.shutdown();
    result
}

async fn run(args: Args) -> Result<ExitCode> {
    let settings = Settings::from_args(args)?;

    let brief = if settings.interactive {
        let stdin = io::stdin();
        prompt::complete_brief(settings.brief.clone(), &mut stdin.lock(), &mut io::stdout())?
    } else {
        settings.brief.clone()
    };

    let executor = compose(&settings);
    let outcome = executor.run(brief).await.context("pipeline run rejected")?;

    if let Err(e) = executor.reporter().flush().await {
        warn!(error = %e, "Failed to deliver served-variant events");
    }

    let dir = export::write_run(&settings.output_dir, &outcome)?;
    info!(terminal = %outcome.terminal, dir = %dir.display(), "Artefacts written");

    println!("Run {} finished: {}", outcome.run_id, outcome.terminal);
    for failure in outcome.state.errors() {
        println!("  {failure}");
    }
    println!("Output saved to: {}", dir.display());

    Ok(if outcome.is_done() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Builds the executor from validated settings.
fn compose(settings: &Settings) -> PipelineExecutor {
    let model = AnthropicProvider::new(settings.anthropic_api_key.clone())
        .with_base_url(settings.anthropic_base_url.as_str())
        .with_timeout(settings.model_timeout);
    let invoker = ModelInvoker::new(Arc::new(model)).with_timeout(settings.model_timeout);

    let (resolver, reporter) = match &settings.ai_config {
        Some(ai_config) => {
            info!(url = %ai_config.base_url, "Using AI-config service");
            let provider = HttpConfigProvider::new(ai_config.clone());
            let reporter: Arc<dyn EventReporter> =
                Arc::new(HttpEventReporter::new(ai_config.clone()));
            (
                ConfigResolver::new(Arc::new(provider)).with_timeout(ai_config.timeout),
                reporter,
            )
        }
        None => {
            info!("No AI-config service configured; using built-in agent defaults");
            let reporter: Arc<dyn EventReporter> = Arc::new(NoopEventReporter);
            (ConfigResolver::defaults_only(), reporter)
        }
    };

    let services = NodeServices::new(resolver, invoker).with_backoff(settings.backoff);
    PipelineExecutor::new(services).with_reporter(reporter)
}
