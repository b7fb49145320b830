//! SQLite-backed checkpointer (feature `sqlite`).
//!
//! State is stored as bytes produced by a `Serializer`; metadata lives in plain columns so
//! `list` does not deserialize state. rusqlite is blocking, so every call runs on
//! `spawn_blocking` against a shared connection. Each checkpoint holds the whole session, so
//! only the newest [`DEFAULT_MAX_CHECKPOINTS`] per thread and namespace are kept.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
use super::checkpointer::{thread_id, CheckpointError, Checkpointer};
use super::config::RunnableConfig;
use super::serializer::Serializer;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS checkpoints (
    thread_id TEXT NOT NULL,
    checkpoint_ns TEXT NOT NULL,
    checkpoint_id TEXT NOT NULL,
    ts TEXT NOT NULL,
    source TEXT NOT NULL,
    step INTEGER NOT NULL,
    created_at INTEGER,
    state BLOB NOT NULL,
    PRIMARY KEY (thread_id, checkpoint_ns, checkpoint_id)
)";

/// Checkpoints kept per thread and namespace unless overridden with `with_max_checkpoints`.
pub const DEFAULT_MAX_CHECKPOINTS: usize = 10;

/// Checkpointer persisting to a SQLite file.
pub struct SqliteSaver<S> {
    conn: Arc<Mutex<Connection>>,
    serializer: Arc<dyn Serializer<S>>,
    max_checkpoints: usize,
}

fn storage<E: std::fmt::Display>(e: E) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

impl<S> SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Opens (or creates) the database at `path` and ensures the table exists.
    pub fn new(
        path: impl AsRef<Path>,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        let conn = Connection::open(path).map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    /// Database that lives only as long as this saver.
    pub fn in_memory(serializer: Arc<dyn Serializer<S>>) -> Result<Self, CheckpointError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    fn with_connection(
        conn: Connection,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        conn.execute(SCHEMA, []).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            serializer,
            max_checkpoints: DEFAULT_MAX_CHECKPOINTS,
        })
    }

    /// Checkpoints kept per thread and namespace; older ones are deleted on `put`. At least
    /// one is always kept.
    pub fn with_max_checkpoints(mut self, max: usize) -> Self {
        self.max_checkpoints = max.max(1);
        self
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, CheckpointError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(storage)?;
            f(&guard).map_err(storage)
        })
        .await
        .map_err(storage)?
    }
}

struct Row {
    id: String,
    ts: String,
    source: String,
    step: i64,
    created_at: Option<i64>,
    state: Vec<u8>,
}

fn metadata(source: &str, step: i64, created_at: Option<i64>) -> CheckpointMetadata {
    CheckpointMetadata {
        source: CheckpointSource::parse(source),
        step: step.max(0) as u64,
        created_at: created_at.map(|ms| UNIX_EPOCH + Duration::from_millis(ms.max(0) as u64)),
    }
}

fn millis(t: Option<SystemTime>) -> Option<i64> {
    t.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let thread = thread_id(config)?.to_string();
        let ns = config.checkpoint_ns.clone();
        let state = self.serializer.serialize(&checkpoint.channel_values)?;
        let id = checkpoint.id.clone();
        let ts = checkpoint.ts.clone();
        let source = checkpoint.metadata.source.as_str();
        let step = checkpoint.metadata.step as i64;
        let created_at = millis(checkpoint.metadata.created_at);
        let saved_id = id.clone();
        let keep = self.max_checkpoints.min(i64::MAX as usize) as i64;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO checkpoints
                 (thread_id, checkpoint_ns, checkpoint_id, ts, source, step, created_at, state)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![thread, ns, id, ts, source, step, created_at, state],
            )?;
            conn.execute(
                "DELETE FROM checkpoints
                 WHERE thread_id = ?1 AND checkpoint_ns = ?2 AND rowid NOT IN (
                     SELECT rowid FROM checkpoints
                     WHERE thread_id = ?1 AND checkpoint_ns = ?2
                     ORDER BY rowid DESC LIMIT ?3
                 )",
                params![thread, ns, keep],
            )
        })
        .await?;
        Ok(saved_id)
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let thread = thread_id(config)?.to_string();
        let ns = config.checkpoint_ns.clone();
        let wanted = config.checkpoint_id.clone();
        let lookup = wanted.clone();
        let row = self
            .with_conn(move |conn| {
                let map = |r: &rusqlite::Row<'_>| {
                    Ok(Row {
                        id: r.get(0)?,
                        ts: r.get(1)?,
                        source: r.get(2)?,
                        step: r.get(3)?,
                        created_at: r.get(4)?,
                        state: r.get(5)?,
                    })
                };
                match lookup {
                    Some(id) => conn
                        .query_row(
                            "SELECT checkpoint_id, ts, source, step, created_at, state
                             FROM checkpoints
                             WHERE thread_id = ?1 AND checkpoint_ns = ?2 AND checkpoint_id = ?3",
                            params![thread, ns, id],
                            map,
                        )
                        .optional(),
                    None => conn
                        .query_row(
                            "SELECT checkpoint_id, ts, source, step, created_at, state
                             FROM checkpoints
                             WHERE thread_id = ?1 AND checkpoint_ns = ?2
                             ORDER BY rowid DESC LIMIT 1",
                            params![thread, ns],
                            map,
                        )
                        .optional(),
                }
            })
            .await?;

        let Some(row) = row else {
            return match wanted {
                Some(id) => Err(CheckpointError::NotFound(id)),
                None => Ok(None),
            };
        };
        let meta = metadata(&row.source, row.step, row.created_at);
        let checkpoint = Checkpoint {
            id: row.id,
            ts: row.ts,
            channel_values: self.serializer.deserialize(&row.state)?,
            metadata: meta.clone(),
        };
        Ok(Some((checkpoint, meta)))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread = thread_id(config)?.to_string();
        let ns = config.checkpoint_ns.clone();
        let limit = limit.map(|l| l.min(i64::MAX as usize) as i64).unwrap_or(-1);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT checkpoint_id, source, step, created_at FROM checkpoints
                 WHERE thread_id = ?1 AND checkpoint_ns = ?2
                 ORDER BY rowid DESC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![thread, ns, limit], |r| {
                let source: String = r.get(1)?;
                Ok(CheckpointListItem {
                    checkpoint_id: r.get(0)?,
                    metadata: metadata(&source, r.get(2)?, r.get(3)?),
                })
            })?;
            rows.collect()
        })
        .await
    }
}
