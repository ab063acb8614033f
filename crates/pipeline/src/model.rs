//! Value types exchanged with the language model.

use serde::{Deserialize, Serialize};

use crate::{AgentConfig, GenerationParameters, ModelId, TokenUsage};

/// One model call: a rendered prompt plus the options to generate with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Model to call.
    pub model: ModelId,
    /// Rendered prompt template, sent as the system prompt.
    pub prompt: String,
    /// User-turn message sent after the prompt.
    pub instruction: String,
    /// Generation options.
    pub parameters: GenerationParameters,
}

impl ModelRequest {
    /// Builds a request from a resolved configuration and an already-rendered prompt.
    pub fn from_config(
        config: &AgentConfig,
        prompt: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            model: config.model().clone(),
            prompt: prompt.into(),
            instruction: instruction.into(),
            parameters: config.parameters().clone(),
        }
    }
}

/// Generated text plus usage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Generated text.
    pub text: String,
    /// Tokens consumed, when the provider reports them.
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    /// Creates a response with text only.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    /// Attaches usage metadata.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}
