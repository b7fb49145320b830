//! Conversation messages: system, user, assistant (with tool calls and usage), tool results.
//!
//! Messages are append-only history entries. Assistant messages carry a unique id so the
//! accounting stage can tell whether it already counted them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::ToolCall;

/// Token usage reported by the inference collaborator for one completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Ollama reports zero counts when it did not evaluate tokens; treat that as no data.
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0
    }
}

/// Assistant turn: either final text or a request for tool calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Identity used by the accounting stage's idempotence marker.
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl AssistantMessage {
    pub fn new(content: impl Into<String>, tool_calls: Vec<ToolCall>, usage: Option<Usage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            tool_calls,
            usage,
        }
    }

    /// Plain text reply without tool calls or usage.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, vec![], None)
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Result of one tool call, appended by the tool-execution stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Id of the tool call this answers (provider-assigned; may be absent).
    pub call_id: Option<String>,
    pub name: String,
    pub content: String,
    /// True when `content` is an error payload (unknown tool, bad input, handled failure).
    #[serde(default)]
    pub is_error: bool,
}

/// Message role, as exposed to chat APIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One entry in the conversation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    System(String),
    User(String),
    Assistant(AssistantMessage),
    Tool(ToolMessage),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant(AssistantMessage::text(content))
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System(_) => Role::System,
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
            Message::Tool(_) => Role::Tool,
        }
    }

    /// Text content regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Message::System(s) | Message::User(s) => s,
            Message::Assistant(a) => &a.content,
            Message::Tool(t) => &t.content,
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Message::Assistant(a) => Some(a),
            _ => None,
        }
    }
}
