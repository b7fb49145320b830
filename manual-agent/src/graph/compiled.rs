//! Compiled state graph: immutable, supports invoke only.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. Holds nodes, the entry
//! node, one outgoing edge per node and an optional checkpointer. When a checkpointer is
//! set and config.thread_id is provided, the final state is saved after a successful invoke.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};

use super::node_middleware::NodeMiddleware;
use super::state_graph::{RouteFn, END};
use super::{Next, Node};

/// Outgoing edge of a node.
pub(super) enum Edge<S> {
    Fixed(String),
    Conditional {
        route: RouteFn<S>,
        targets: HashSet<String>,
    },
}

impl<S> Clone for Edge<S> {
    fn clone(&self) -> Self {
        match self {
            Edge::Fixed(to) => Edge::Fixed(to.clone()),
            Edge::Conditional { route, targets } => Edge::Conditional {
                route: Arc::clone(route),
                targets: targets.clone(),
            },
        }
    }
}

/// Compiled graph: immutable structure, supports invoke only.
///
/// Runs from the entry node; after each node uses the returned `Next` and the node's edge to
/// choose the next node. A run that fails leaves the checkpointer untouched.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) entry: String,
    pub(super) edges: HashMap<String, Edge<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) recursion_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Resolves the node after `current_id` for `Next::Continue`. Returns `None` for END.
    fn follow_edge(&self, current_id: &str, state: &S) -> Result<Option<String>, AgentError> {
        let edge = self.edges.get(current_id).ok_or_else(|| {
            AgentError::ExecutionFailed(format!("node {} has no outgoing edge", current_id))
        })?;
        let to = match edge {
            Edge::Fixed(to) => to.clone(),
            Edge::Conditional { route, targets } => {
                let to = route(state);
                if !targets.contains(&to) {
                    return Err(AgentError::ExecutionFailed(format!(
                        "route from {} returned undeclared target {}",
                        current_id, to
                    )));
                }
                to
            }
        };
        Ok(if to == END { None } else { Some(to) })
    }

    async fn run_node(&self, node_id: &str, state: S) -> Result<(S, Next), AgentError> {
        let node = self
            .nodes
            .get(node_id)
            .cloned()
            .ok_or_else(|| AgentError::ExecutionFailed(format!("node not found: {}", node_id)))?;
        match &self.middleware {
            Some(middleware) => {
                middleware
                    .around_run(
                        node_id,
                        state,
                        Box::new(move |s| Box::pin(async move { node.run(s).await })),
                    )
                    .await
            }
            None => node.run(state).await,
        }
    }

    /// Runs the graph with the given state, starting at the entry node.
    ///
    /// - `Next::Continue`: follow the node's edge; a conditional edge evaluates its route.
    /// - `Next::Node(id)`: run the node with that id next.
    /// - `Next::End`: stop.
    ///
    /// Fails with `RecursionLimit` when more node steps than the limit are needed. When
    /// `config` has `thread_id` and the graph was compiled with a checkpointer, the final
    /// state is saved; a failed save is returned as `AgentError::Checkpoint`.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        let mut state = state;
        let mut current = Some(self.entry.clone());
        let mut steps: usize = 0;

        while let Some(node_id) = current {
            if steps >= self.recursion_limit {
                return Err(AgentError::RecursionLimit(self.recursion_limit));
            }
            steps += 1;

            let (new_state, next) = self.run_node(&node_id, state).await?;
            state = new_state;

            current = match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => self.follow_edge(&node_id, &state)?,
            };
            debug!(node_id = %node_id, next = ?current, "graph step");
        }

        if let (Some(cp), Some(cfg)) = (&self.checkpointer, &config) {
            if cfg.thread_id.is_some() {
                let checkpoint =
                    Checkpoint::from_state(state.clone(), CheckpointSource::Update, steps as u64);
                cp.put(cfg, &checkpoint)
                    .await
                    .map_err(|e| AgentError::Checkpoint(e.to_string()))?;
            }
        }
        Ok(state)
    }

    /// Returns the checkpointer the graph was compiled with.
    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer<S>>> {
        self.checkpointer.as_ref()
    }
}
