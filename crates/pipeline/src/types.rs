//! Shared value types for the Launchpad pipeline domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants and participate in domain computations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// Number of tokens consumed in an LLM API call.
///
/// Sums saturate at `u64::MAX` rather than overflow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Creates a [`TokenCount`] from a raw integer.
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for TokenCount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for TokenCount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

// ---------------------------------------------------------------------------

/// Token usage reported by the model for one call (or accumulated over a run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub input: TokenCount,
    /// Tokens in the generated output.
    pub output: TokenCount,
}

impl TokenUsage {
    /// Creates a [`TokenUsage`] from raw input/output counts.
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input: TokenCount::new(input),
            output: TokenCount::new(output),
        }
    }

    /// Input plus output tokens.
    pub fn total(self) -> TokenCount {
        self.input + self.output
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input += rhs.input;
        self.output += rhs.output;
    }
}

// ---------------------------------------------------------------------------
// Generation parameters
// ---------------------------------------------------------------------------

/// Open mapping of generation option name to value (`temperature`,
/// `max_tokens`, `top_p`, ...).
///
/// The configuration provider may serve options the pipeline does not know
/// about; they are carried through untouched and the model adapter decides
/// which ones it forwards. Keys are ordered so serialisation is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationParameters(BTreeMap<String, Value>);

impl GenerationParameters {
    /// Option name for sampling temperature.
    pub const TEMPERATURE: &'static str = "temperature";
    /// Option name for the output token cap.
    pub const MAX_TOKENS: &'static str = "max_tokens";

    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, replacing any previous value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the raw value of an option.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Sampling temperature, if set to a number.
    pub fn temperature(&self) -> Option<f64> {
        self.get(Self::TEMPERATURE).and_then(Value::as_f64)
    }

    /// Output token cap, if set to a non-negative integer.
    pub fn max_tokens(&self) -> Option<u64> {
        self.get(Self::MAX_TOKENS).and_then(Value::as_u64)
    }

    /// Iterates options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if no options are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for GenerationParameters {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage::new(100, 20);
        usage += TokenUsage::new(50, 5);
        assert_eq!(usage.input.as_u64(), 150);
        assert_eq!(usage.output.as_u64(), 25);
        assert_eq!(usage.total().as_u64(), 175);
    }

    #[test]
    fn test_usage_saturates_instead_of_overflowing() {
        let mut usage = TokenUsage::new(u64::MAX, 10);
        usage += TokenUsage::new(1, 5);
        assert_eq!(usage.input.as_u64(), u64::MAX);
        assert_eq!(usage.output.as_u64(), 15);
        assert_eq!(usage.total().as_u64(), u64::MAX);
    }

    #[test]
    fn test_parameters_typed_accessors() {
        let params = GenerationParameters::new()
            .with(GenerationParameters::TEMPERATURE, 0.4)
            .with(GenerationParameters::MAX_TOKENS, 2048)
            .with("top_p", 0.9);

        assert_eq!(params.temperature(), Some(0.4));
        assert_eq!(params.max_tokens(), Some(2048));
        assert_eq!(params.get("top_p").and_then(Value::as_f64), Some(0.9));
    }

    #[test]
    fn test_parameters_ignore_wrongly_typed_values() {
        let params = GenerationParameters::new()
            .with(GenerationParameters::TEMPERATURE, "hot")
            .with(GenerationParameters::MAX_TOKENS, -1);

        assert_eq!(params.temperature(), None);
        assert_eq!(params.max_tokens(), None);
    }
}
