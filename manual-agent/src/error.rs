//! Agent execution error types.
//!
//! Returned by `Node::run` and `CompiledStateGraph::invoke`. Every variant here is
//! fatal to the current turn; non-fatal conditions (unknown tool, missing usage
//! metadata, ambiguous classification) are absorbed by the nodes themselves.

use thiserror::Error;

/// Agent execution error.
///
/// A turn that returns one of these leaves the session at its last checkpoint:
/// the graph only persists state after a successful run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. tool transport error, bad routing).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The inference collaborator could not be reached or returned no usable answer.
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),

    /// The model kept requesting tools after the per-turn round budget was spent.
    #[error("tool loop limit reached after {0} rounds")]
    ToolLoopLimit(u32),

    /// The graph ran more node steps than its recursion limit allows.
    #[error("recursion limit of {0} steps reached")]
    RecursionLimit(usize),

    /// Saving the final state failed.
    #[error("checkpoint failed: {0}")]
    Checkpoint(String),
}
