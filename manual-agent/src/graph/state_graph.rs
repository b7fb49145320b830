//! State graph builder: nodes + fixed edges + conditional edges.
//!
//! Add nodes with `add_node`, wire them with `add_edge(from, to)` (use `START` and `END`
//! for entry/exit) or `add_conditional_edges(from, route, targets)`, then `compile` or
//! `compile_with_checkpointer` to get a `CompiledStateGraph`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::{CompiledStateGraph, Edge};
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::memory::Checkpointer;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// Maximum node steps per invoke unless overridden with `with_recursion_limit`.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Routing function for a conditional edge: reads the state a node produced and returns
/// the id of the next node (or `END`).
pub type RouteFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// State graph: nodes plus fixed and conditional edges.
///
/// Generic over state type `S`. Each node has exactly one outgoing edge, either fixed
/// (`add_edge`) or conditional (`add_conditional_edges`). Cycles are allowed; the compiled
/// graph bounds every run with a recursion limit.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional: Vec<(String, RouteFn<S>, Vec<String>)>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    recursion_limit: usize,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional: Vec::new(),
            middleware: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Adds a node; replaces any node registered under the same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds a fixed edge from `from_id` to `to_id`.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds a conditional edge: after `from_id` runs, `route` picks the next node.
    ///
    /// `targets` lists every id `route` may return (node ids or `END`); they are checked at
    /// compile time, and a route returning anything else fails the run.
    pub fn add_conditional_edges<F, I, T>(
        &mut self,
        from_id: impl Into<String>,
        route: F,
        targets: I,
    ) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.conditional.push((
            from_id.into(),
            Arc::new(route),
            targets.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Wraps every node run with `middleware`.
    pub fn with_middleware(mut self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        self.middleware = Some(middleware);
        self
    }

    /// Maximum node steps per invoke.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Builds the executable graph without persistence.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None)
    }

    /// Builds the executable graph with a checkpointer. When `invoke(state, config)` is called
    /// with `config.thread_id`, the final state is saved after a successful run.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer))
    }

    fn check_known(&self, id: &str, sentinel: &str) -> Result<(), CompilationError> {
        if id != sentinel && !self.nodes.contains_key(id) {
            return Err(CompilationError::NodeNotFound(id.to_string()));
        }
        Ok(())
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            self.check_known(from, START)?;
            self.check_known(to, END)?;
        }
        for (from, _, targets) in &self.conditional {
            if from == START {
                return Err(CompilationError::InvalidEdges(
                    "conditional edge from START".into(),
                ));
            }
            self.check_known(from, START)?;
            if targets.is_empty() {
                return Err(CompilationError::InvalidEdges(format!(
                    "conditional edge from {} has no targets",
                    from
                )));
            }
            for t in targets {
                self.check_known(t, END)?;
            }
        }

        let mut start_targets = self.edges.iter().filter(|(f, _)| f == START);
        let entry = match (start_targets.next(), start_targets.next()) {
            (Some((_, to)), None) if to != END => to.clone(),
            _ => return Err(CompilationError::MissingStart),
        };

        let reaches_end = self.edges.iter().any(|(_, t)| t == END)
            || self
                .conditional
                .iter()
                .any(|(_, _, targets)| targets.iter().any(|t| t == END));
        if !reaches_end {
            return Err(CompilationError::MissingEnd);
        }

        let mut edges: HashMap<String, Edge<S>> = HashMap::new();
        for (from, to) in self.edges.into_iter().filter(|(f, _)| f != START) {
            if edges.insert(from.clone(), Edge::Fixed(to)).is_some() {
                return Err(CompilationError::InvalidEdges(format!(
                    "node {} has more than one outgoing edge",
                    from
                )));
            }
        }
        for (from, route, targets) in self.conditional {
            let edge = Edge::Conditional {
                route,
                targets: targets.into_iter().collect::<HashSet<_>>(),
            };
            if edges.insert(from.clone(), edge).is_some() {
                return Err(CompilationError::InvalidEdges(format!(
                    "node {} has more than one outgoing edge",
                    from
                )));
            }
        }
        if let Some(id) = self.nodes.keys().find(|id| !edges.contains_key(*id)) {
            return Err(CompilationError::InvalidEdges(format!(
                "node {} has no outgoing edge",
                id
            )));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            entry,
            edges,
            checkpointer,
            middleware: self.middleware,
            recursion_limit: self.recursion_limit,
        })
    }
}
