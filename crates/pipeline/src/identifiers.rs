//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! an [`AgentId`] with a [`ModelId`] even though both are strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or only whitespace.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline execution run.
///
/// Generated fresh for every run; propagated through spans and served-variant
/// events so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineRunId(Uuid);

impl PipelineRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PipelineRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (configuration keys / provider names)
// ---------------------------------------------------------------------------

string_id! {
    /// Configuration key naming one agent at the configuration provider
    /// (e.g. `"idea-validator"`).
    AgentId
}

string_id! {
    /// Model identifier understood by the language model provider
    /// (e.g. `"claude-3-5-sonnet-latest"`).
    ModelId
}

impl AgentId {
    /// Wraps a compile-time constant key known to be non-empty.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }
}

impl ModelId {
    /// Wraps a compile-time constant model name known to be non-empty.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }
}

string_id! {
    /// Targeting key used by the configuration provider for deterministic
    /// variant assignment (a user or session key).
    UserKey
}

string_id! {
    /// Identifies which configuration variant served a node invocation.
    ///
    /// Opaque to the pipeline; recorded on served-variant events so external
    /// experimentation analysis can attribute outcomes to variants.
    ProvenanceToken
}

impl ProvenanceToken {
    /// Token value carried by the built-in default configurations.
    pub const FALLBACK: &'static str = "fallback";

    /// Returns the token that marks a built-in default configuration.
    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_string())
    }

    /// Returns `true` if this token marks a built-in default configuration.
    pub fn is_fallback(&self) -> bool {
        self.0 == Self::FALLBACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_id_rejects_blank_values() {
        assert!(AgentId::new("").is_none());
        assert!(AgentId::new("   ").is_none());
        assert_eq!(
            AgentId::new("idea-validator").map(|id| id.to_string()),
            Some("idea-validator".to_string())
        );
    }

    #[test]
    fn test_fallback_provenance() {
        let token = ProvenanceToken::fallback();
        assert!(token.is_fallback());
        assert!(!ProvenanceToken::new("variant-b").unwrap().is_fallback());
    }

    #[test]
    fn test_string_id_serializes_transparently() {
        let id = ModelId::new("claude-3-5-haiku-latest").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"claude-3-5-haiku-latest\"");
    }
}
