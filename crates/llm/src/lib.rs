//! Launchpad language-model infrastructure adapter.
//!
//! Implements the [`pipeline::LlmProvider`] trait for Anthropic's Messages
//! API. Additional providers are added as new modules in this crate without
//! any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response parsing,
//! and status classification live here. Timeouts around the whole call and
//! retry decisions belong to the `nodes` crate; the [`pipeline`] crate sees
//! only [`pipeline::LlmProvider`].

pub mod anthropic;
mod messages;

pub use anthropic::{AnthropicProvider, ANTHROPIC_VERSION, DEFAULT_BASE_URL};
pub use messages::DEFAULT_MAX_TOKENS;
