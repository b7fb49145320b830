//! Graph node trait: one step that receives state and returns updated state plus `Next`.

use async_trait::async_trait;

use crate::error::AgentError;

use super::Next;

/// One step in a state graph.
///
/// Receives the full state by value and returns the updated state and the transition to
/// take. Implementations should not keep per-run state of their own; everything a later
/// step needs goes into `S`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Node id, used in logs. The graph addresses nodes by the id given to `add_node`.
    fn id(&self) -> &str;

    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
