//! State graph: nodes, fixed and conditional edges, compile and invoke.
//!
//! Aligns with LangGraph `StateGraph`: add nodes and edges, compile, then invoke with state.
//! Conditional edges let a node's outgoing transition depend on the state it produced,
//! which is how the turn router expresses its branches and the tools → reasoning loop.

mod compile_error;
mod compiled;
mod logging;
mod next;
mod node;
mod node_middleware;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use logging::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeFuture, NodeMiddleware, NodeRunFn};
pub use state_graph::{RouteFn, StateGraph, DEFAULT_RECURSION_LIMIT, END, START};
