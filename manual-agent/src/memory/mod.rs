//! # Memory: checkpointing
//!
//! Per-session state snapshots keyed by `(thread_id, checkpoint_ns, checkpoint_id)`.
//! A compiled graph saves its final state after a successful invoke when it was compiled
//! with a checkpointer and the config carries a `thread_id`.
//!
//! | Type             | Persistence | Use case                 | Feature  |
//! |------------------|-------------|--------------------------|----------|
//! | [`MemorySaver`]  | In-memory   | Tests, throwaway sessions | (none)   |
//! | [`SqliteSaver`]  | SQLite file | Sessions across restarts  | `sqlite` |
//!
//! [`JsonSerializer`] is used by `SqliteSaver` (state must be `Serialize + DeserializeOwned`).

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;

#[cfg(feature = "sqlite")]
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};

#[cfg(feature = "sqlite")]
pub use sqlite_saver::{SqliteSaver, DEFAULT_MAX_CHECKPOINTS};
