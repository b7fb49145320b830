//! with_middleware: every node run goes through the middleware.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use manual_agent::graph::NodeRunFn;
use manual_agent::{
    AgentError, LoggingNodeMiddleware, Next, NodeMiddleware, StateGraph, END, START,
};

use crate::common::{AppendNode, CounterState};

struct RecordingMiddleware {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl NodeMiddleware<CounterState> for RecordingMiddleware {
    async fn around_run(
        &self,
        node_id: &str,
        state: CounterState,
        inner: NodeRunFn<CounterState>,
    ) -> Result<(CounterState, Next), AgentError> {
        self.seen.lock().unwrap().push(format!("before {}", node_id));
        let result = inner(state).await;
        self.seen.lock().unwrap().push(format!("after {}", node_id));
        result
    }
}

fn two_node_graph() -> StateGraph<CounterState> {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_node("b", Arc::new(AppendNode::new("b")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    graph
}

#[tokio::test]
async fn middleware_wraps_each_node() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let compiled = two_node_graph()
        .with_middleware(Arc::new(RecordingMiddleware { seen: seen.clone() }))
        .compile()
        .unwrap();
    let out = compiled.invoke(CounterState::default(), None).await.unwrap();
    assert_eq!(out.count, 2);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["before a", "after a", "before b", "after b"]
    );
}

#[tokio::test]
async fn logging_middleware_keeps_result() {
    let compiled = two_node_graph()
        .with_middleware(Arc::new(LoggingNodeMiddleware::<CounterState>::default()))
        .compile()
        .unwrap();
    let out = compiled.invoke(CounterState::default(), None).await.unwrap();
    assert_eq!(out.visited, vec!["a", "b"]);
}
