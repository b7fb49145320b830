//! Checkpoint and metadata types.
//!
//! A checkpoint is a full snapshot of the graph state for one session, saved after a
//! successful run.

use std::time::SystemTime;

use uuid::Uuid;

/// Metadata for a single checkpoint (source, step, created_at).
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Node steps the run took before the snapshot.
    pub step: u64,
    pub created_at: Option<SystemTime>,
}

/// Source of the checkpoint (input, loop, update, fork).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointSource {
    Input,
    Loop,
    Update,
    Fork,
}

impl CheckpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointSource::Input => "input",
            CheckpointSource::Loop => "loop",
            CheckpointSource::Update => "update",
            CheckpointSource::Fork => "fork",
        }
    }

    /// Parses the stored form; unknown strings map to `Update`.
    pub fn parse(s: &str) -> Self {
        match s {
            "input" => CheckpointSource::Input,
            "loop" => CheckpointSource::Loop,
            "fork" => CheckpointSource::Fork,
            _ => CheckpointSource::Update,
        }
    }
}

/// One checkpoint: state snapshot plus id/ts.
///
/// Stored by a `Checkpointer` keyed by (thread_id, checkpoint_ns, checkpoint_id).
/// `channel_values` is the graph state `S`.
///
/// **Interaction**: Produced by `CompiledStateGraph::invoke`; consumed by
/// `Checkpointer::put`, returned by `get_tuple`.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub id: String,
    /// Milliseconds since the Unix epoch, as text.
    pub ts: String,
    pub channel_values: S,
    pub metadata: CheckpointMetadata,
}

/// Item returned by `Checkpointer::list`.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// Creates a checkpoint from the current state. Uses the current time for ts.
    pub fn from_state(state: S, source: CheckpointSource, step: u64) -> Self {
        let now = SystemTime::now();
        let ts = now
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
            .to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            ts,
            channel_values: state,
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(now),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Every source survives as_str then parse.
    #[test]
    fn checkpoint_source_str_forms() {
        for s in [
            CheckpointSource::Input,
            CheckpointSource::Loop,
            CheckpointSource::Update,
            CheckpointSource::Fork,
        ] {
            assert_eq!(CheckpointSource::parse(s.as_str()), s);
        }
        assert_eq!(CheckpointSource::parse("bogus"), CheckpointSource::Update);
    }

    /// **Scenario**: from_state fills metadata and gives each checkpoint its own id.
    #[test]
    fn from_state_sets_metadata_and_unique_id() {
        let a = Checkpoint::from_state(1, CheckpointSource::Update, 4);
        let b = Checkpoint::from_state(1, CheckpointSource::Update, 4);
        assert_ne!(a.id, b.id);
        assert_eq!(a.metadata.step, 4);
        assert_eq!(a.metadata.source, CheckpointSource::Update);
        assert!(a.metadata.created_at.is_some());
        assert!(a.ts.parse::<u128>().is_ok());
    }
}
