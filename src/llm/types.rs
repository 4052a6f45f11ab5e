//! Common types for completion requests

use serde::{Deserialize, Serialize};

/// Role of a turn sent to the completion provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling options for a single completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature, 0.0..=2.0
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    /// Free chat and assessment questioning turns
    pub const CONVERSATIONAL: Self = Self {
        temperature: 0.7,
        max_tokens: 200,
    };

    /// Score restatement: deterministic and allowed a longer answer
    pub const SCORING: Self = Self {
        temperature: 0.0,
        max_tokens: 500,
    };

    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 2.0),
            max_tokens,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::CONVERSATIONAL
    }
}

/// Completion request: ordered turns plus sampling options
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
    pub options: CompletionOptions,
}

impl LlmRequest {
    pub fn new(messages: Vec<LlmMessage>, options: CompletionOptions) -> Self {
        Self { messages, options }
    }

    /// Content of the system turn, if the request carries one
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the last user turn
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Completion response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Usage,
}

impl LlmResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: Usage::default(),
        }
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
