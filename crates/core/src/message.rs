//! Generation request and message domain types.
//!
//! These are the value objects that flow through the pipeline:
//! client sends a `GenerationRequest` → composer builds a prompt →
//! backend generates → gateway answers with a `GenerationResponse`
//! or a stream of `StreamChunk`s.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The model
    Assistant,
    /// Any role string outside the three above. Accepted on the wire,
    /// dropped when the prompt is composed.
    #[serde(other)]
    Unrecognized,
}

/// A single message of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// An inbound generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user's prompt
    pub prompt: String,

    /// Maximum number of tokens to generate (`num_predict` on the backend).
    /// Negative values keep their backend meaning: `-1` unlimited, `-2` fill the context.
    #[serde(default = "default_max_length")]
    pub max_length: i32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Stream the answer as server-sent events
    #[serde(default)]
    pub stream: bool,

    /// Model override; the configured default model is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// System text placed at the top of the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Free-form context placed after the knowledge block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Conversation history. Non-empty history switches to conversation mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,

    /// Inject stored knowledge entries into the prompt
    #[serde(default = "default_true")]
    pub use_knowledge: bool,

    /// Only inject entries of this category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_category: Option<String>,
}

fn default_max_length() -> i32 {
    100
}

fn default_temperature() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

impl GenerationRequest {
    /// A request for `prompt` with every other field at its default.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_length: default_max_length(),
            temperature: default_temperature(),
            stream: false,
            model: None,
            system: None,
            context: None,
            messages: None,
            use_knowledge: true,
            knowledge_category: None,
        }
    }

    /// The history, if any messages were supplied.
    pub fn history(&self) -> Option<&[ChatMessage]> {
        self.messages.as_deref().filter(|m| !m.is_empty())
    }
}

/// A complete (non-streaming) generation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The text produced by the backend
    pub generated_text: String,

    /// The caller's original prompt, not the composed one
    pub prompt: String,

    /// The model that was asked to generate
    pub model: String,
}

/// One outward event of a streamed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamChunk {
    /// A fragment of generated text plus everything generated so far.
    Delta {
        text: String,
        full_text: String,
        done: bool,
    },

    /// Terminal failure; nothing follows it.
    Error { error: String },
}

impl StreamChunk {
    /// Whether the outward stream ends after this event.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Delta { done, .. } => *done,
            Self::Error { .. } => true,
        }
    }
}
