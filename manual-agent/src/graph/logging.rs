//! Logging middleware that records node enter/exit around each node.run call.

use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AgentError;

use super::node_middleware::{NodeMiddleware, NodeRunFn};
use super::Next;

/// Middleware that logs node enter/exit through `tracing`.
///
/// Enter and successful exit go to debug; a node error is logged at warn before it is
/// returned unchanged.
pub struct LoggingNodeMiddleware<S> {
    _state: PhantomData<fn(S)>,
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self {
            _state: PhantomData,
        }
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError> {
        debug!(node = node_id, "enter node");
        let result = inner(state).await;
        match &result {
            Ok((_, next)) => debug!(node = node_id, next = ?next, "exit node"),
            Err(e) => warn!(node = node_id, error = %e, "node failed"),
        }
        result
    }
}
