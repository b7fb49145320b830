//! Tools node: execute the tool calls of the latest assistant message, append results.
//!
//! Calls in one batch run concurrently; results are appended in request order, one
//! `ToolMessage` per call. Control always returns to the reasoning node.
//!
//! # Error Handling
//!
//! - `ToolSourceError::NotFound` always becomes an error result listing the available tools.
//! - `ToolSourceError::InvalidInput` always becomes an error result.
//! - `ToolSourceError::Transport` follows `HandleToolErrors`:
//!   - `HandleToolErrors::Never` - the turn fails (default)
//!   - `HandleToolErrors::Always` - caught and returned as an error result
//!   - `HandleToolErrors::Custom(handler)` - handler produces the result text

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::{Message, ToolMessage};
use crate::state::{ToolCall, TurnState};
use crate::tool_source::{ToolSource, ToolSourceError};

use super::NODE_TOOLS;

/// Truncates a string for logging, appending "..." if longer than max_len.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

/// Default execution error message template with tool name and kwargs.
pub const DEFAULT_EXECUTION_ERROR_TEMPLATE: &str =
    "Error executing tool '{tool_name}' with kwargs {tool_kwargs} with error:\n {error}\n Please fix the error and try again.";

/// Error handler function type.
///
/// Takes the error, tool name, and tool arguments, returns an error message string.
pub type ErrorHandlerFn =
    Arc<dyn Fn(&ToolSourceError, &str, &Value) -> String + Send + Sync + 'static>;

/// How ToolsNode handles transport failures.
#[derive(Clone, Default)]
pub enum HandleToolErrors {
    /// Errors propagate and fail the turn.
    #[default]
    Never,
    /// Errors are caught and returned as an error result.
    /// Uses the default error template if None.
    Always(Option<String>),
    /// Custom error handler function.
    Custom(ErrorHandlerFn),
}

impl std::fmt::Debug for HandleToolErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => write!(f, "HandleToolErrors::Never"),
            Self::Always(msg) => write!(f, "HandleToolErrors::Always({:?})", msg),
            Self::Custom(_) => write!(f, "HandleToolErrors::Custom(<fn>)"),
        }
    }
}

/// Tool-execution stage.
///
/// **Interaction**: Implements `Node<TurnState>`. Consumes a `ToolSource`; reads the tool
/// calls of the newest assistant message, appends `Message::Tool` entries and bumps
/// `tool_rounds`.
pub struct ToolsNode {
    tools: Box<dyn ToolSource>,
    handle_tool_errors: HandleToolErrors,
}

impl ToolsNode {
    /// Creates a tools node. Transport errors fail the turn (`HandleToolErrors::Never`).
    pub fn new(tools: Box<dyn ToolSource>) -> Self {
        Self {
            tools,
            handle_tool_errors: HandleToolErrors::Never,
        }
    }

    pub fn with_handle_tool_errors(mut self, handle_tool_errors: HandleToolErrors) -> Self {
        self.handle_tool_errors = handle_tool_errors;
        self
    }

    fn template_message(error: &ToolSourceError, tool_name: &str, tool_args: &Value) -> String {
        DEFAULT_EXECUTION_ERROR_TEMPLATE
            .replace("{tool_name}", tool_name)
            .replace("{tool_kwargs}", &tool_args.to_string())
            .replace("{error}", &error.to_string())
    }

    /// Returns Some(error_message) when a transport error is caught, None when it propagates.
    fn handle_transport(
        &self,
        error: &ToolSourceError,
        tool_name: &str,
        tool_args: &Value,
    ) -> Option<String> {
        match &self.handle_tool_errors {
            HandleToolErrors::Never => None,
            HandleToolErrors::Always(custom_msg) => Some(
                custom_msg
                    .clone()
                    .unwrap_or_else(|| Self::template_message(error, tool_name, tool_args)),
            ),
            HandleToolErrors::Custom(handler) => Some(handler(error, tool_name, tool_args)),
        }
    }

    async fn not_found_message(&self, name: &str) -> String {
        let available = match self.tools.list_tools().await {
            Ok(specs) => specs
                .into_iter()
                .map(|s| s.name)
                .collect::<Vec<_>>()
                .join(", "),
            Err(_) => "unknown".to_string(),
        };
        format!(
            "Error: tool '{}' not found. Available tools: {}.",
            name, available
        )
    }

    async fn call_one(&self, tc: &ToolCall) -> (Value, Result<String, ToolSourceError>) {
        let args: Value = if tc.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&tc.arguments).unwrap_or(serde_json::json!({}))
        };
        debug!(tool = %tc.name, args = ?args, "Calling tool");
        let result = self
            .tools
            .call_tool(&tc.name, args.clone())
            .await
            .map(|c| c.text);
        (args, result)
    }
}

#[async_trait]
impl Node<TurnState> for ToolsNode {
    fn id(&self) -> &str {
        NODE_TOOLS
    }

    async fn run(&self, mut state: TurnState) -> Result<(TurnState, Next), AgentError> {
        let calls: Vec<ToolCall> = state.pending_tool_calls().to_vec();
        let outcomes = join_all(calls.iter().map(|tc| self.call_one(tc))).await;

        let mut results = Vec::with_capacity(calls.len());
        for (i, (tc, (args, outcome))) in calls.iter().zip(outcomes).enumerate() {
            let (content, is_error) = match outcome {
                Ok(text) => {
                    trace!(
                        tool = %tc.name,
                        result_len = text.len(),
                        result_preview = %truncate_for_log(&text, 200),
                        "Tool returned"
                    );
                    (text, false)
                }
                Err(ToolSourceError::NotFound(name)) => {
                    warn!(tool = %name, "Unknown tool requested");
                    (self.not_found_message(&name).await, true)
                }
                Err(e @ ToolSourceError::InvalidInput(_)) => {
                    warn!(tool = %tc.name, error = %e, "Tool rejected input");
                    let msg = match &self.handle_tool_errors {
                        HandleToolErrors::Custom(handler) => handler(&e, &tc.name, &args),
                        _ => Self::template_message(&e, &tc.name, &args),
                    };
                    (msg, true)
                }
                Err(e) => {
                    warn!(tool = %tc.name, error = %e, "Tool call failed");
                    match self.handle_transport(&e, &tc.name, &args) {
                        Some(msg) => (msg, true),
                        None => return Err(AgentError::ExecutionFailed(e.to_string())),
                    }
                }
            };
            results.push(Message::Tool(ToolMessage {
                call_id: Some(tc.call_id(i)),
                name: tc.name.clone(),
                content,
                is_error,
            }));
        }

        state.messages.extend(results);
        state.tool_rounds += 1;
        Ok((state, Next::Continue))
    }
}
