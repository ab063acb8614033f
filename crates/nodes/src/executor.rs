//! Orchestration graph: drives a run through the [`Stage`] state machine.

use std::sync::Arc;

use pipeline::{
    EventReporter, IdeaBrief, LaunchpadError, NoopEventReporter, PipelineOutcome, PipelineRunId,
    PipelineState, Stage, TerminalState, Timestamp, TokenUsage,
};
use tracing::{info, instrument, warn};

use crate::{AgentNode, BackoffPolicy, NodeServices};

/// Runs the Validator, LandingPageWriter, and TechStackRecommender in order.
///
/// A run stops at the first node failure. Independent runs share nothing
/// mutable, so one executor may serve many concurrent runs.
#[derive(Clone)]
pub struct PipelineExecutor {
    services: NodeServices,
    reporter: Arc<dyn EventReporter>,
}

impl PipelineExecutor {
    /// Creates an executor that discards served-variant events.
    pub fn new(services: NodeServices) -> Self {
        Self {
            services,
            reporter: Arc::new(NoopEventReporter),
        }
    }

    /// Replaces the retry budget applied by every node.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.services = self.services.with_backoff(backoff);
        self
    }

    /// Sends one served-variant event per node run to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn EventReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// The event reporter runs are recorded to.
    pub fn reporter(&self) -> &Arc<dyn EventReporter> {
        &self.reporter
    }

    /// Runs the pipeline for `brief` until it reaches a terminal state.
    ///
    /// Node failures end the run in [`TerminalState::Failed`] and are recorded
    /// in the returned state; they are not errors of this method.
    ///
    /// # Errors
    ///
    /// - [`LaunchpadError::EmptyIdea`] if the idea is blank. No node runs.
    /// - [`LaunchpadError::OutputAlreadyWritten`] or
    ///   [`LaunchpadError::OutOfSequence`] if a node output violates the
    ///   state's write discipline.
    pub async fn run(&self, brief: IdeaBrief) -> Result<PipelineOutcome, LaunchpadError> {
        self.run_with_id(PipelineRunId::new_random(), brief).await
    }

    #[instrument(name = "pipeline_run", skip(self, brief), fields(run_id = %run_id))]
    async fn run_with_id(
        &self,
        run_id: PipelineRunId,
        brief: IdeaBrief,
    ) -> Result<PipelineOutcome, LaunchpadError> {
        let started_at = Timestamp::now();
        let mut state = PipelineState::new(brief)?;
        let mut stage = Stage::Start;
        let mut usage = TokenUsage::default();

        info!("Pipeline run started");

        let terminal = loop {
            if let Some(terminal) = stage.terminal() {
                break terminal;
            }
            let Some(role) = stage.next_role() else {
                stage = Stage::Done;
                continue;
            };

            let report = AgentNode::new(role).run(&self.services, &state).await;
            usage += report.usage;
            self.reporter.record(report.served_event(run_id));

            let next = match report.outcome {
                Ok(output) => {
                    state.apply(output)?;
                    Stage::after_success(role)
                }
                Err(failure) => {
                    warn!(agent = %role, error = %failure, "Pipeline run failed");
                    state.record_failure(failure);
                    Stage::Failed
                }
            };
            info!(
                agent = %role,
                provenance = %report.config.provenance(),
                from = ?stage,
                to = ?next,
                "Stage transition"
            );
            stage = next;
        };

        info!(
            terminal = %terminal,
            input_tokens = usage.input.as_u64(),
            output_tokens = usage.output.as_u64(),
            "Pipeline run finished"
        );

        Ok(PipelineOutcome {
            run_id,
            terminal,
            state,
            usage,
            started_at,
            finished_at: Timestamp::now(),
        })
    }
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
