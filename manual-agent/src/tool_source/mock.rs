//! Mock ToolSource for tests.
//!
//! Fixed tool list, per-tool canned results or failures, and a shared log of the calls it
//! received.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Mock tool source: fixed tool list and fixed call results.
///
/// `call_tool` on a name that is not listed returns `NotFound`, like the real registry.
/// Clones share the call log.
#[derive(Clone)]
pub struct MockToolSource {
    tools: Vec<ToolSpec>,
    results: HashMap<String, Result<String, ToolSourceError>>,
    default_result: String,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockToolSource {
    /// Lists the given tools; every call returns `call_result` unless overridden per tool.
    pub fn new(tools: Vec<ToolSpec>, call_result: impl Into<String>) -> Self {
        Self {
            tools,
            results: HashMap::new(),
            default_result: call_result.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The two assistant tools with canned answers.
    pub fn manual_and_web() -> Self {
        Self::new(
            vec![
                spec("search_manual", "Search the owner's manual.", "question"),
                spec("search_web", "Search the web.", "query"),
            ],
            "no results",
        )
    }

    /// Text returned when `name` is called.
    pub fn with_result(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.results.insert(name.into(), Ok(text.into()));
        self
    }

    /// Error returned when `name` is called.
    pub fn with_error(mut self, name: impl Into<String>, error: ToolSourceError) -> Self {
        self.results.insert(name.into(), Err(error));
        self
    }

    /// Calls received so far, in order: (tool name, arguments).
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn spec(name: &str, description: &str, arg: &str) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: json!({
            "type": "object",
            "properties": { arg: { "type": "string" } },
            "required": [arg]
        }),
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((name.to_string(), arguments));
        }
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(ToolSourceError::NotFound(name.to_string()));
        }
        match self.results.get(name) {
            Some(Ok(text)) => Ok(ToolCallContent { text: text.clone() }),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(ToolCallContent {
                text: self.default_result.clone(),
            }),
        }
    }
}
