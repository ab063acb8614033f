//! Launchpad pipeline nodes, model gateway, and orchestration.
//!
//! This crate provides the configuration resolver, the model invoker that
//! wraps every model call, the role-parametrised [`AgentNode`], and the
//! [`PipelineExecutor`] that walks the stage machine defined in [`pipeline`].
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Nodes sequence calls between business logic in the
//! [`pipeline`] crate and the port traits it defines (configuration provider,
//! language model, event reporter). They contain no domain rules of their own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`resolver`] | `ConfigResolver`: one provider attempt, defaults on any failure |
//! | [`invoker`] | `ModelInvoker`: timeout and empty-answer validation |
//! | [`backoff`] | `BackoffPolicy`: retry budget and delay schedule |
//! | [`agent`] | `AgentNode`, `NodeServices`, `NodeReport` |
//! | [`executor`] | `PipelineExecutor` |

pub mod agent;
pub mod backoff;
pub mod executor;
pub mod invoker;
pub mod resolver;

pub use agent::{AgentNode, NodeOutcome, NodeReport, NodeServices};
pub use backoff::BackoffPolicy;
pub use executor::PipelineExecutor;
pub use invoker::ModelInvoker;
pub use resolver::ConfigResolver;
