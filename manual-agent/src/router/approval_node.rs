//! Approval gate: a human (or policy) decides whether a batch of tool calls may run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::{Message, ToolMessage};
use crate::state::{ToolCall, TurnState};

use super::NODE_APPROVAL;

/// Result recorded for each call of a rejected batch.
pub const TOOL_NOT_APPROVED: &str = "Error: tool call was not approved by the user.";

/// Appended after the rejected results; tells the model to answer without tools.
pub const REJECTION_MESSAGE: &str = "[SYSTEM: The requested tool calls were not approved. Please respond to the user's question directly without using tools.]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// Decides whether the tool calls of one assistant message may be executed.
#[async_trait]
pub trait ToolApprover: Send + Sync {
    async fn review(&self, calls: &[ToolCall]) -> ApprovalDecision;
}

/// Node between reasoning and tool execution.
///
/// Approved batches pass through untouched. A rejected batch leaves the request as it is:
/// each call gets an error result ([`TOOL_NOT_APPROVED`]), then `REJECTION_MESSAGE` is
/// appended and one tool round is consumed. The newest message then requests nothing, so
/// the outgoing edge returns to reasoning.
pub struct ApprovalNode {
    approver: Arc<dyn ToolApprover>,
}

impl ApprovalNode {
    pub fn new(approver: Arc<dyn ToolApprover>) -> Self {
        Self { approver }
    }
}

#[async_trait]
impl Node<TurnState> for ApprovalNode {
    fn id(&self) -> &str {
        NODE_APPROVAL
    }

    async fn run(&self, mut state: TurnState) -> Result<(TurnState, Next), AgentError> {
        let calls = state.pending_tool_calls().to_vec();
        if calls.is_empty() {
            return Ok((state, Next::Continue));
        }
        match self.approver.review(&calls).await {
            ApprovalDecision::Approved => {
                info!(count = calls.len(), "tool calls approved");
            }
            ApprovalDecision::Rejected => {
                info!(count = calls.len(), "tool calls rejected");
                state
                    .messages
                    .extend(calls.iter().enumerate().map(|(i, call)| {
                        Message::Tool(ToolMessage {
                            call_id: Some(call.call_id(i)),
                            name: call.name.clone(),
                            content: TOOL_NOT_APPROVED.to_string(),
                            is_error: true,
                        })
                    }));
                state.messages.push(Message::assistant(REJECTION_MESSAGE));
                state.tool_rounds += 1;
            }
        }
        Ok((state, Next::Continue))
    }
}
