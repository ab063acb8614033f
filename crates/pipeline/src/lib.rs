//! Core domain for Launchpad.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, error type, and port trait used by the idea pipeline. Infrastructure
//! crates implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`AgentId`, `ModelId`, `ProvenanceToken`, etc.) |
//! | [`types`] | Shared value types (`TokenUsage`, `GenerationParameters`, `Timestamp`) |
//! | [`errors`] | Error taxonomy, `NodeFailure`, and `RetryPolicy` |
//! | [`agent`] | `AgentRole`, `AgentConfig`, `ResolutionContext` |
//! | [`model`] | `ModelRequest` / `ModelResponse` |
//! | [`output`] | Versioned node output shapes and their parsers |
//! | [`render`] | Prompt template rendering |
//! | [`state`] | `PipelineState`, `Stage`, `PipelineOutcome` |
//! | [`ports`] | `ConfigProvider`, `LlmProvider`, `EventReporter` |
//! | [`defaults`] | Built-in fallback prompts and parameters |

pub mod agent;
pub mod defaults;
pub mod errors;
pub mod identifiers;
pub mod model;
pub mod output;
pub mod ports;
pub mod render;
pub mod state;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use agent::{keys, AgentConfig, AgentRole, ResolutionContext};
pub use errors::{
    ConfigProviderError, FailureKind, LaunchpadError, ModelError, NodeFailure, ParseError,
    ReportError, RetryPolicy, TemplateError,
};
pub use identifiers::{AgentId, ModelId, PipelineRunId, ProvenanceToken, UserKey};
pub use model::{ModelRequest, ModelResponse};
pub use output::{
    LandingPage, TechChoice, TechStackRecommendation, ValidationResult, Verdict,
    OUTPUT_CONTRACT_VERSION,
};
pub use ports::{
    ConfigProvider, ConfigServedEvent, EventOutcome, EventReporter, LlmProvider,
    NoopEventReporter, ProviderConfig,
};
pub use render::{check_template, render_template};
pub use state::{IdeaBrief, NodeOutput, PipelineOutcome, PipelineState, Stage, TerminalState};
pub use types::{GenerationParameters, Timestamp, TokenCount, TokenUsage};
