//! LLM client abstraction for the reasoning stage.
//!
//! The reasoning node depends on a callable that returns assistant text, optional
//! tool_calls and the token usage of the completion; this module defines the trait, a
//! scripted mock and the OpenAI-compatible client (feature `openai`).

mod mock;

#[cfg(feature = "openai")]
mod openai;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::{Message, Usage};
use crate::state::ToolCall;

/// Response from an LLM completion.
///
/// **Interaction**: Returned by `LlmClient::invoke()`; the reasoning node turns it into one
/// `AssistantMessage` (content, tool_calls and usage).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool calls requested by the model; empty means a final answer.
    pub tool_calls: Vec<ToolCall>,
    /// Token counts, when the backend reports them.
    pub usage: Option<Usage>,
}

/// LLM client: given the conversation, returns the next assistant turn.
///
/// Implementations: `MockLlm` (scripted responses), `ChatOpenAI` (OpenAI-compatible API,
/// feature `openai`). An unreachable backend is reported as
/// `AgentError::InferenceUnavailable`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}
