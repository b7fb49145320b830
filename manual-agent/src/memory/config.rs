//! Invoke config: thread_id, checkpoint_id, checkpoint_ns.
//!
//! Used by `CompiledStateGraph::invoke` and every `Checkpointer` method.

/// Config for a single invoke. Identifies the session and optional checkpoint.
///
/// When using a checkpointer, invoke must provide at least `thread_id`; without it the
/// graph runs but nothing is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Session id. Required when using a checkpointer.
    pub thread_id: Option<String>,
    /// If set, load this checkpoint instead of the latest.
    pub checkpoint_id: Option<String>,
    /// Optional namespace for checkpoints. Default is empty.
    pub checkpoint_ns: String,
}

impl RunnableConfig {
    /// Config for the latest checkpoint of `thread_id` in the default namespace.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Default::default()
        }
    }
}
