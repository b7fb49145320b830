//! Checkpointer trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use super::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata};
use super::config::RunnableConfig;

/// Error from checkpoint storage.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The config has no thread_id.
    #[error("thread_id is required")]
    ThreadIdRequired,

    #[error("serialization: {0}")]
    Serialization(String),

    #[error("storage: {0}")]
    Storage(String),

    /// `config.checkpoint_id` names a checkpoint that does not exist.
    #[error("checkpoint not found: {0}")]
    NotFound(String),
}

/// Per-session state snapshots.
///
/// Keyed by (thread_id, checkpoint_ns, checkpoint_id). `get_tuple` returns the checkpoint
/// named by `config.checkpoint_id`, or the latest one for the thread when it is unset.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Saves a checkpoint and returns its id.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError>;

    /// Loads a checkpoint; `Ok(None)` when the thread has none.
    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError>;

    /// Lists checkpoints for the thread, newest first, up to `limit`.
    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError>;
}

pub(crate) fn thread_id(config: &RunnableConfig) -> Result<&str, CheckpointError> {
    config
        .thread_id
        .as_deref()
        .ok_or(CheckpointError::ThreadIdRequired)
}
