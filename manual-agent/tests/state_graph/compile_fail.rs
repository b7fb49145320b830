//! StateGraph compile failure cases: unknown node, missing START/END, duplicate edges.

use std::sync::Arc;

use manual_agent::{CompilationError, StateGraph, END, START};

use crate::common::{AppendNode, CounterState};

#[tokio::test]
async fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::<CounterState>::new();
    graph.add_node("a", Arc::new(AppendNode::new("a")));
    graph.add_edge(START, "a");
    graph.add_edge("a", "missing");

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn compile_fails_when_conditional_target_unknown() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_edge(START, "a")
        .add_conditional_edges("a", |_: &CounterState| END.to_string(), [END, "ghost"]);

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "ghost"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn compile_fails_without_start_edge() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_edge("a", END);
    assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
}

#[tokio::test]
async fn compile_fails_with_two_start_edges() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_node("b", Arc::new(AppendNode::new("b")))
        .add_edge(START, "a")
        .add_edge(START, "b")
        .add_edge("a", END)
        .add_edge("b", END);
    assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
}

#[tokio::test]
async fn compile_fails_when_end_unreachable() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_edge(START, "a")
        .add_edge("a", "a");
    assert!(matches!(graph.compile(), Err(CompilationError::MissingEnd)));
}

#[tokio::test]
async fn compile_fails_with_fixed_and_conditional_edge_on_one_node() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_edge(START, "a")
        .add_edge("a", END)
        .add_conditional_edges("a", |_: &CounterState| END.to_string(), [END]);
    assert!(matches!(
        graph.compile(),
        Err(CompilationError::InvalidEdges(_))
    ));
}

#[tokio::test]
async fn compile_fails_when_node_has_no_outgoing_edge() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_node("orphan", Arc::new(AppendNode::new("orphan")))
        .add_edge(START, "a")
        .add_edge("a", END);
    match graph.compile() {
        Err(CompilationError::InvalidEdges(msg)) => assert!(msg.contains("orphan"), "{}", msg),
        other => panic!("expected InvalidEdges, got {:?}", other.err()),
    }
}
