//! StateGraph invoke: node order, conditional routing, recursion limit, checkpointing.

use std::sync::Arc;

use manual_agent::{AgentError, Checkpointer, MemorySaver, RunnableConfig, StateGraph, END, START};

use crate::common::{AppendNode, CounterState};

#[tokio::test]
async fn invoke_runs_nodes_in_edge_order() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_node("b", Arc::new(AppendNode::new("b")))
        .add_node("c", Arc::new(AppendNode::new("c")))
        .add_edge(START, "a")
        .add_edge("a", "c")
        .add_edge("c", "b")
        .add_edge("b", END);

    let out = graph
        .compile()
        .expect("valid graph")
        .invoke(CounterState::default(), None)
        .await
        .unwrap();
    assert_eq!(out.visited, vec!["a", "c", "b"]);
}

#[tokio::test]
async fn invoke_conditional_loop_then_exit() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("work", Arc::new(AppendNode::new("work")))
        .add_node("done", Arc::new(AppendNode::new("done")))
        .add_edge(START, "work")
        .add_conditional_edges(
            "work",
            |s: &CounterState| {
                let to = if s.count < 3 { "work" } else { "done" };
                to.to_string()
            },
            ["work", "done"],
        )
        .add_edge("done", END);

    let out = graph
        .compile()
        .unwrap()
        .invoke(CounterState::default(), None)
        .await
        .unwrap();
    assert_eq!(out.visited, vec!["work", "work", "work", "done"]);
}

#[tokio::test]
async fn invoke_endless_loop_hits_recursion_limit() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("spin", Arc::new(AppendNode::new("spin")))
        .add_edge(START, "spin")
        .add_conditional_edges("spin", |_: &CounterState| "spin".to_string(), ["spin", END]);

    let result = graph
        .compile()
        .unwrap()
        .invoke(CounterState::default(), None)
        .await;
    assert!(matches!(result, Err(AgentError::RecursionLimit(25))));
}

#[tokio::test]
async fn invoke_with_checkpointer_saves_per_thread() {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node("a", Arc::new(AppendNode::new("a")))
        .add_edge(START, "a")
        .add_edge("a", END);
    let saver = Arc::new(MemorySaver::<CounterState>::new());
    let compiled = graph.compile_with_checkpointer(saver.clone()).unwrap();

    let first = compiled
        .invoke(CounterState::default(), Some(RunnableConfig::for_thread("one")))
        .await
        .unwrap();
    compiled
        .invoke(first.clone(), Some(RunnableConfig::for_thread("one")))
        .await
        .unwrap();

    let history = saver
        .list(&RunnableConfig::for_thread("one"), None)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    let (latest, _) = saver
        .get_tuple(&RunnableConfig::for_thread("one"))
        .await
        .unwrap()
        .expect("saved");
    assert_eq!(latest.channel_values.count, 2);
    assert!(saver
        .get_tuple(&RunnableConfig::for_thread("two"))
        .await
        .unwrap()
        .is_none());
}
