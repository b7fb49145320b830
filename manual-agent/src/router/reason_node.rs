//! Reason node: send the history to the model, append its answer or tool-call request.
//!
//! The outgoing conditional edge reads the appended message: tool calls go to tool
//! execution (or the approval gate), a plain answer goes to usage accounting.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::message::{AssistantMessage, Message};
use crate::state::TurnState;

use super::NODE_REASON;

/// Tool rounds allowed per turn before a further tool request fails the turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 5;

/// Reasoning stage.
///
/// **Interaction**: Implements `Node<TurnState>`. Consumes an `LlmClient`; appends one
/// `AssistantMessage` carrying content, tool calls and usage. Inference failures propagate
/// as `AgentError::InferenceUnavailable` without touching the state.
pub struct ReasonNode {
    llm: Box<dyn LlmClient>,
    max_tool_rounds: u32,
}

impl ReasonNode {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: u32) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }
}

#[async_trait]
impl Node<TurnState> for ReasonNode {
    fn id(&self) -> &str {
        NODE_REASON
    }

    async fn run(&self, mut state: TurnState) -> Result<(TurnState, Next), AgentError> {
        let response = self.llm.invoke(&state.messages).await?;

        if !response.tool_calls.is_empty() {
            if state.tool_rounds >= self.max_tool_rounds {
                warn!(
                    rounds = state.tool_rounds,
                    max = self.max_tool_rounds,
                    "model keeps requesting tools"
                );
                return Err(AgentError::ToolLoopLimit(self.max_tool_rounds));
            }
            let names: Vec<&str> = response.tool_calls.iter().map(|tc| tc.name.as_str()).collect();
            debug!(tools = ?names, round = state.tool_rounds + 1, "model requested tools");
        } else {
            debug!(len = response.content.len(), "model answered");
        }

        state.messages.push(Message::Assistant(AssistantMessage::new(
            response.content,
            response.tool_calls,
            response.usage,
        )));
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::MockLlm;
    use crate::message::Usage;
    use crate::state::UsageCounters;

    fn state(question: &str) -> TurnState {
        let mut s = TurnState::new("sys", UsageCounters::default());
        s.begin_turn(question);
        s
    }

    /// **Scenario**: A tool request is appended with its usage; the model saw the whole history.
    #[tokio::test]
    async fn appends_tool_request() {
        let llm = MockLlm::new().then_tool_call(
            "search_manual",
            json!({"question": "fuse 33"}),
            Some(Usage::new(50, 10)),
        );
        let node = ReasonNode::new(Box::new(llm.clone()));
        let (out, next) = node.run(state("what is fuse 33 for?")).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(out.pending_tool_calls().len(), 1);
        assert_eq!(out.last_assistant().unwrap().usage, Some(Usage::new(50, 10)));
        assert_eq!(llm.inputs()[0].len(), 2);
    }

    /// **Scenario**: Requesting tools with no rounds left fails with ToolLoopLimit.
    #[tokio::test]
    async fn tool_request_past_limit_fails() {
        let llm = MockLlm::new().then_tool_call("search_web", json!({"query": "x"}), None);
        let node = ReasonNode::new(Box::new(llm)).with_max_tool_rounds(2);
        let mut s = state("q");
        s.tool_rounds = 2;
        match node.run(s).await {
            Err(AgentError::ToolLoopLimit(2)) => {}
            other => panic!("expected ToolLoopLimit(2), got {:?}", other.map(|_| ())),
        }
    }

    /// **Scenario**: A final answer is allowed even when the tool budget is spent.
    #[tokio::test]
    async fn final_answer_past_limit_ok() {
        let node = ReasonNode::new(Box::new(MockLlm::with_no_tool_calls("done")))
            .with_max_tool_rounds(0);
        let (out, _) = node.run(state("q")).await.unwrap();
        assert_eq!(out.final_reply(), Some("done"));
    }

    /// **Scenario**: An unreachable model propagates InferenceUnavailable.
    #[tokio::test]
    async fn inference_failure_propagates() {
        let node = ReasonNode::new(Box::new(MockLlm::new().then_unavailable("refused")));
        assert!(matches!(
            node.run(state("q")).await,
            Err(AgentError::InferenceUnavailable(_))
        ));
    }
}
