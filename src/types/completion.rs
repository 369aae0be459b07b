use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ChatMessage, Model};

/// Maximum tokens requested for every reply.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Sampling temperature used for every request.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Request body for the chat-completions endpoint.
///
/// Constructed fresh for every call and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Conversation in order, system prompt first.
    pub messages: Vec<ChatMessage>,

    /// Model identifier.
    pub model: Model,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f64,

    /// Whether to stream the reply.  Always false.
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Creates a non-streaming request with the fixed sampling parameters.
    pub fn new(messages: Vec<ChatMessage>, model: Model) -> Self {
        Self {
            messages,
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            stream: false,
        }
    }
}

/// Token accounting reported by the server, when present.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionUsage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Tokens in the reply.
    #[serde(default)]
    pub completion_tokens: u64,

    /// Sum of the two.
    #[serde(default)]
    pub total_tokens: u64,
}

/// The message inside a choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceMessage {
    /// Role string as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One completion choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Choice {
    /// Index of this choice.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChoiceMessage>,

    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Response body from the chat-completions endpoint.
///
/// The body is externally defined; the only part decidr depends on is
/// `choices[0].message.content`.  Everything else is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatCompletionResponse {
    /// Response identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Model that produced the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Generated choices.
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
}

impl ChatCompletionResponse {
    /// Returns `choices[0].message.content`, if present.
    pub fn reply_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
    }

    /// Returns the reply text or a response parse error describing what was missing.
    pub fn reply(&self) -> Result<&str> {
        self.reply_text().ok_or_else(|| {
            Error::response_parse("response did not contain choices[0].message.content", None)
        })
    }
}
