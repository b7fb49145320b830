//! In-memory checkpointer for tests and sessions that need not outlive the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata};
use super::checkpointer::{thread_id, CheckpointError, Checkpointer};
use super::config::RunnableConfig;

type ThreadKey = (String, String);

/// Keeps every checkpoint per (thread_id, checkpoint_ns) in insertion order.
pub struct MemorySaver<S> {
    threads: RwLock<HashMap<ThreadKey, Vec<Checkpoint<S>>>>,
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(config: &RunnableConfig) -> Result<ThreadKey, CheckpointError> {
    Ok((thread_id(config)?.to_string(), config.checkpoint_ns.clone()))
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = key(config)?;
        let mut threads = self.threads.write().await;
        threads.entry(key).or_default().push(checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let key = key(config)?;
        let threads = self.threads.read().await;
        let Some(list) = threads.get(&key) else {
            return match &config.checkpoint_id {
                Some(id) => Err(CheckpointError::NotFound(id.clone())),
                None => Ok(None),
            };
        };
        let found = match &config.checkpoint_id {
            Some(id) => Some(
                list.iter()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| CheckpointError::NotFound(id.clone()))?,
            ),
            None => list.last(),
        };
        Ok(found.map(|c| (c.clone(), c.metadata.clone())))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let key = key(config)?;
        let threads = self.threads.read().await;
        let items = threads
            .get(&key)
            .map(|list| {
                list.iter()
                    .rev()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|c| CheckpointListItem {
                        checkpoint_id: c.id.clone(),
                        metadata: c.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CheckpointSource;

    fn cp(value: i32, step: u64) -> Checkpoint<i32> {
        Checkpoint::from_state(value, CheckpointSource::Update, step)
    }

    /// **Scenario**: get_tuple returns the latest checkpoint; list is newest first.
    #[tokio::test]
    async fn put_then_latest_and_list() {
        let saver = MemorySaver::<i32>::new();
        let config = RunnableConfig::for_thread("t1");
        saver.put(&config, &cp(1, 1)).await.unwrap();
        let second = saver.put(&config, &cp(2, 2)).await.unwrap();

        let (latest, meta) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(latest.channel_values, 2);
        assert_eq!(meta.step, 2);

        let items = saver.list(&config, None).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].checkpoint_id, second);
        assert_eq!(saver.list(&config, Some(1)).await.unwrap().len(), 1);
    }

    /// **Scenario**: checkpoint_id selects an older snapshot; an unknown id is NotFound.
    #[tokio::test]
    async fn get_tuple_by_checkpoint_id() {
        let saver = MemorySaver::<i32>::new();
        let config = RunnableConfig::for_thread("t1");
        let first = saver.put(&config, &cp(1, 1)).await.unwrap();
        saver.put(&config, &cp(2, 2)).await.unwrap();

        let by_id = RunnableConfig {
            checkpoint_id: Some(first),
            ..config.clone()
        };
        let (old, _) = saver.get_tuple(&by_id).await.unwrap().unwrap();
        assert_eq!(old.channel_values, 1);

        let missing = RunnableConfig {
            checkpoint_id: Some("nope".into()),
            ..config
        };
        assert!(matches!(
            saver.get_tuple(&missing).await,
            Err(CheckpointError::NotFound(_))
        ));
    }

    /// **Scenario**: Threads are isolated and thread_id is required.
    #[tokio::test]
    async fn threads_isolated_and_thread_id_required() {
        let saver = MemorySaver::<i32>::new();
        saver
            .put(&RunnableConfig::for_thread("a"), &cp(1, 1))
            .await
            .unwrap();
        assert!(saver
            .get_tuple(&RunnableConfig::for_thread("b"))
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            saver.put(&RunnableConfig::default(), &cp(1, 1)).await,
            Err(CheckpointError::ThreadIdRequired)
        ));
    }
}
