//! Scripted LLM for tests.
//!
//! Returns queued responses in order; once the script is exhausted the last response
//! repeats. Clones share the script, the call counter and the recorded inputs, so a test
//! can keep a handle after boxing one clone into the graph.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::{Message, Usage};
use crate::state::ToolCall;

#[derive(Clone, Debug)]
enum Scripted {
    Reply(LlmResponse),
    Unavailable(String),
}

#[derive(Default)]
struct Shared {
    queue: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<Vec<Message>>>,
}

/// Mock LLM with a response script.
#[derive(Clone, Default)]
pub struct MockLlm {
    shared: Arc<Shared>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answers `content` without tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::new().then_reply(content, None)
    }

    /// Queues a final answer.
    pub fn then_reply(self, content: impl Into<String>, usage: Option<Usage>) -> Self {
        self.push(Scripted::Reply(LlmResponse {
            content: content.into(),
            tool_calls: vec![],
            usage,
        }))
    }

    /// Queues a tool-call request for `name` with JSON `arguments`.
    pub fn then_tool_call(
        self,
        name: impl Into<String>,
        arguments: serde_json::Value,
        usage: Option<Usage>,
    ) -> Self {
        let n = self.shared.calls_queued();
        self.then_tool_calls(
            vec![ToolCall {
                name: name.into(),
                arguments: arguments.to_string(),
                id: Some(format!("call_{}", n)),
            }],
            usage,
        )
    }

    /// Queues a request for several tool calls at once.
    pub fn then_tool_calls(self, tool_calls: Vec<ToolCall>, usage: Option<Usage>) -> Self {
        self.push(Scripted::Reply(LlmResponse {
            content: String::new(),
            tool_calls,
            usage,
        }))
    }

    /// Queues an `InferenceUnavailable` failure.
    pub fn then_unavailable(self, reason: impl Into<String>) -> Self {
        self.push(Scripted::Unavailable(reason.into()))
    }

    fn push(self, item: Scripted) -> Self {
        if let Ok(mut q) = self.shared.queue.lock() {
            q.push_back(item);
        }
        self
    }

    /// Number of invoke calls so far.
    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    /// Message lists passed to each invoke, in call order.
    pub fn inputs(&self) -> Vec<Vec<Message>> {
        self.shared
            .inputs
            .lock()
            .map(|i| i.clone())
            .unwrap_or_default()
    }
}

impl Shared {
    fn calls_queued(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    fn next(&self) -> Option<Scripted> {
        let popped = self.queue.lock().ok()?.pop_front();
        let mut last = self.last.lock().ok()?;
        if let Some(item) = popped {
            *last = Some(item);
        }
        last.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut inputs) = self.shared.inputs.lock() {
            inputs.push(messages.to_vec());
        }
        match self.shared.next() {
            Some(Scripted::Reply(r)) => Ok(r),
            Some(Scripted::Unavailable(reason)) => Err(AgentError::InferenceUnavailable(reason)),
            None => Err(AgentError::InferenceUnavailable(
                "mock llm has no scripted response".into(),
            )),
        }
    }
}
