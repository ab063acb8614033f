//! Wire types for the Anthropic Messages API.

use pipeline::{GenerationParameters, ModelRequest, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Output token cap used when the configuration does not set one.
pub const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Generation options forwarded to the API in addition to `max_tokens`.
const FORWARDED_OPTIONS: [&str; 4] = ["temperature", "top_p", "top_k", "stop_sequences"];

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u64,
    pub system: &'a str,
    pub messages: Vec<Message<'a>>,
    #[serde(flatten)]
    pub options: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> MessagesRequest<'a> {
    pub fn from_model_request(request: &'a ModelRequest) -> Self {
        Self {
            model: request.model.as_str(),
            max_tokens: request
                .parameters
                .max_tokens()
                .unwrap_or(DEFAULT_MAX_TOKENS),
            system: &request.prompt,
            messages: vec![Message {
                role: "user",
                content: &request.instruction,
            }],
            options: forwarded_options(&request.parameters),
        }
    }
}

fn forwarded_options(parameters: &GenerationParameters) -> serde_json::Map<String, Value> {
    let mut options = serde_json::Map::new();
    for (name, value) in parameters.iter() {
        if FORWARDED_OPTIONS.contains(&name) {
            options.insert(name.to_string(), value.clone());
        } else if name != GenerationParameters::MAX_TOKENS {
            debug!(option = name, "Generation option not supported by Anthropic; dropped");
        }
    }
    options
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl MessagesResponse {
    /// Concatenated text of every text block, or `None` if there are none.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }

    pub fn token_usage(&self) -> Option<TokenUsage> {
        self.usage
            .as_ref()
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
    }
}
