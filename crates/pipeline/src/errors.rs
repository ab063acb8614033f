//! Error taxonomy and retry-policy types for the Launchpad pipeline domain.
//!
//! [`LaunchpadError`] covers programming errors and precondition violations:
//! the only conditions under which running the pipeline does not yield a
//! terminal state. Business-level failures of a single node are recorded as a
//! [`NodeFailure`] tagged with a [`FailureKind`] instead.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that participates
//! in retry decisions must be able to produce a [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::AgentRole;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Only rate-limit responses from the model are retryable. Every other model
/// failure surfaces immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt (e.g. from a `retry-after`
        /// response header). `None` means apply the caller's own schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that prevent a run from producing a terminal state.
///
/// These are never produced by a model or configuration-provider failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum LaunchpadError {
    /// The idea text was empty or only whitespace.
    ///
    /// Reported before any node runs.
    #[error("Idea must not be empty")]
    EmptyIdea,

    /// A node output was merged into a state that already holds that field.
    #[error("Pipeline state field '{field}' has already been written")]
    OutputAlreadyWritten {
        /// Name of the state field.
        field: String,
    },

    /// A node output was merged before the outputs it depends on.
    #[error("Output of {agent} merged out of sequence")]
    OutOfSequence {
        /// Role whose output arrived early.
        agent: AgentRole,
    },
}

// ---------------------------------------------------------------------------
// Node failures
// ---------------------------------------------------------------------------

/// Classification of a node failure as recorded in the pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network or authentication failure reaching the model.
    ProviderUnavailable,
    /// The model rejected the call for rate reasons and the retry budget ran out.
    RateLimited,
    /// The model answered with content failing minimal validation (e.g. empty).
    InvalidResponse,
    /// The model call exceeded its timeout.
    Timeout,
    /// The model answered but the content did not match the role's output shape.
    MalformedOutput,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::ProviderUnavailable => "provider_unavailable",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::InvalidResponse => "invalid_response",
            FailureKind::Timeout => "timeout",
            FailureKind::MalformedOutput => "malformed_output",
        };
        f.write_str(s)
    }
}

/// One failure record appended to `PipelineState::errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
    /// Node that failed.
    pub agent: AgentRole,
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub message: String,
    /// Number of model calls made before giving up (0 if the model was never called).
    pub attempts: u32,
}

impl std::fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed ({}) after {} attempt(s): {}",
            self.agent, self.kind, self.attempts, self.message
        )
    }
}

// ---------------------------------------------------------------------------
// Model errors
// ---------------------------------------------------------------------------

/// Failure of a single model call, as classified by the model invoker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Network or authentication failure.
    #[error("Model provider unavailable: {message}")]
    ProviderUnavailable {
        /// Transport or status detail.
        message: String,
    },

    /// The provider asked the caller to slow down.
    #[error("Model provider rate limited the request")]
    RateLimited {
        /// Delay requested by the provider, when it sent one.
        retry_after: Option<Duration>,
    },

    /// The provider answered with content that fails minimal validation.
    #[error("Model returned an invalid response: {message}")]
    InvalidResponse {
        /// What was wrong with the response.
        message: String,
    },

    /// The call did not complete within its timeout.
    #[error("Model call timed out after {}ms", .elapsed.as_millis())]
    Timeout {
        /// Time allowed for the call.
        elapsed: Duration,
    },
}

impl ModelError {
    /// Maps this error onto the failure taxonomy recorded in pipeline state.
    pub fn kind(&self) -> FailureKind {
        match self {
            ModelError::ProviderUnavailable { .. } => FailureKind::ProviderUnavailable,
            ModelError::RateLimited { .. } => FailureKind::RateLimited,
            ModelError::InvalidResponse { .. } => FailureKind::InvalidResponse,
            ModelError::Timeout { .. } => FailureKind::Timeout,
        }
    }

    /// Returns the retry policy for this error.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            ModelError::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration-provider errors
// ---------------------------------------------------------------------------

/// Failure of a single configuration-provider lookup.
///
/// Always absorbed by the configuration resolver, which falls back to the
/// built-in default configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigProviderError {
    /// The provider could not be reached.
    #[error("Configuration provider unavailable: {0}")]
    Unavailable(String),

    /// The provider did not answer within its timeout.
    #[error("Configuration provider timed out")]
    Timeout,

    /// The provider answered with data that cannot form an agent configuration.
    #[error("Configuration provider returned malformed data: {0}")]
    Malformed(String),

    /// The provider serves this agent's configuration as disabled.
    #[error("Configuration for '{0}' is disabled")]
    Disabled(String),
}

// ---------------------------------------------------------------------------
// Template errors
// ---------------------------------------------------------------------------

/// A prompt template that does not compile or cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid prompt template: {0}")]
pub struct TemplateError(pub String);

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        Self(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Output parsing errors
// ---------------------------------------------------------------------------

/// Role-specific structural parsing failure of a model answer.
///
/// Recorded as [`FailureKind::MalformedOutput`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `Verdict:` line or `verdict` field was found.
    #[error("No verdict found in validator output")]
    MissingVerdict,

    /// The verdict value is not part of the taxonomy.
    #[error("Unknown verdict '{0}'")]
    UnknownVerdict(String),

    /// The verdict has no supporting rationale.
    #[error("Validator output has no rationale")]
    EmptyRationale,

    /// The landing page has no content beyond markdown punctuation.
    #[error("Landing page output has no content")]
    EmptyLandingPage,

    /// No technology choice could be read from the recommendation.
    #[error("Tech stack output contains no technology choices")]
    NoTechChoices,

    /// Output looked like JSON but did not match the expected shape.
    #[error("Output is not valid JSON for this role: {0}")]
    InvalidJson(String),
}

// ---------------------------------------------------------------------------
// Event reporting errors
// ---------------------------------------------------------------------------

/// Failure delivering served-variant events. Never affects a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The events endpoint could not be reached.
    #[error("Event transport failed: {0}")]
    Transport(String),

    /// The events endpoint rejected the batch.
    #[error("Event endpoint rejected batch with status {status}")]
    Rejected {
        /// HTTP status returned.
        status: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_is_retryable() {
        let rate_limited = ModelError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(
            rate_limited.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(2))
            }
        );

        for err in [
            ModelError::ProviderUnavailable {
                message: "connection refused".into(),
            },
            ModelError::InvalidResponse {
                message: "empty".into(),
            },
            ModelError::Timeout {
                elapsed: Duration::from_secs(30),
            },
        ] {
            assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable, "{err} must not retry");
        }
    }

    #[test]
    fn test_model_error_kinds() {
        assert_eq!(
            ModelError::Timeout {
                elapsed: Duration::from_millis(5)
            }
            .kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            ModelError::RateLimited { retry_after: None }.kind(),
            FailureKind::RateLimited
        );
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::MalformedOutput).unwrap();
        assert_eq!(json, "\"malformed_output\"");
        assert_eq!(FailureKind::MalformedOutput.to_string(), "malformed_output");
    }

    #[test]
    fn test_node_failure_display() {
        let failure = NodeFailure {
            agent: AgentRole::LandingPageWriter,
            kind: FailureKind::InvalidResponse,
            message: "empty completion".into(),
            attempts: 1,
        };
        assert_eq!(
            failure.to_string(),
            "landing-page-writer failed (invalid_response) after 1 attempt(s): empty completion"
        );
    }
}
