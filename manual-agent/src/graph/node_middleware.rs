//! Middleware wrapping each node run (logging, timing, tracing spans).

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;

use super::Next;

/// Boxed future returned by the inner node call.
pub type NodeFuture<S> = Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>>;

/// The wrapped node call handed to middleware.
pub type NodeRunFn<S> = Box<dyn FnOnce(S) -> NodeFuture<S> + Send>;

/// Wraps every node run in a compiled graph.
///
/// Implementations call `inner(state)` exactly once and may inspect or log around it.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeRunFn<S>,
    ) -> Result<(S, Next), AgentError>;
}
