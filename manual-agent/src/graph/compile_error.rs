//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes or the edge set
//! cannot be executed (no entry, no exit, ambiguous transitions).

use thiserror::Error;

/// Error when compiling a state graph.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START, or more than one such edge.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// No fixed or conditional edge leads to END.
    #[error("graph must have at least one path to END")]
    MissingEnd,

    /// A node has more than one outgoing edge, or none at all.
    #[error("invalid edges: {0}")]
    InvalidEdges(String),
}
