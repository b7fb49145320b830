//! Tool source abstraction: list the tools a model may call and execute a call by name.
//!
//! The tools node talks only to `ToolSource`; `ToolRegistry` (crate::tools) is the
//! production implementation and `MockToolSource` the test one.

mod mock;

pub use mock::MockToolSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool description sent to the model (name, description, JSON schema of the arguments).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Text result of one tool call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallContent {
    pub text: String,
}

/// Tool call failure.
///
/// `NotFound` is never fatal to a turn. `InvalidInput` and `Transport` are handled by the
/// tools node according to its error policy.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport: {0}")]
    Transport(String),
}

/// Source of callable tools.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    async fn call_tool(&self, name: &str, arguments: Value)
        -> Result<ToolCallContent, ToolSourceError>;
}
