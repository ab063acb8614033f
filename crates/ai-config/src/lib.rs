//! Launchpad AI-config client adapter.
//!
//! Implements [`pipeline::ConfigProvider`] and [`pipeline::EventReporter`]
//! over the AI-config service's HTTP API: per-agent variant evaluation and
//! batched served-variant events.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, context encoding, and response mapping
//! live here. The [`pipeline`] crate sees only the port traits; fallback to
//! default configurations and timeouts around each lookup belong to the
//! `nodes` crate's resolver.

pub mod events;
pub mod provider;

pub use events::HttpEventReporter;
pub use provider::{AiConfigSettings, HttpConfigProvider, ANONYMOUS_CONTEXT_KEY};
