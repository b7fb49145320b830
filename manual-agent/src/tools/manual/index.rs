//! Similarity search over manual chunks.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::tool_source::ToolSourceError;

use super::chunk::{chunk_manual, ManualChunk};
use super::embedder::Embedder;

/// One search result.
#[derive(Clone, Debug, PartialEq)]
pub struct ManualHit {
    pub page: usize,
    pub text: String,
    pub score: f32,
}

/// Searchable manual.
#[async_trait]
pub trait ManualIndex: Send + Sync {
    /// Up to `k` chunks most relevant to `query`, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ManualHit>, ToolSourceError>;
}

/// In-memory vector index: every chunk embedded once at build time, ranked by cosine
/// similarity at query time.
pub struct VectorManualIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(ManualChunk, Vec<f32>)>,
}

impl VectorManualIndex {
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        chunks: Vec<ManualChunk>,
    ) -> Result<Self, ToolSourceError> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(ToolSourceError::Transport(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        Ok(Self {
            embedder,
            entries: chunks.into_iter().zip(vectors).collect(),
        })
    }

    /// Chunks and indexes a text export (pages separated by form feeds).
    pub async fn from_text(embedder: Arc<dyn Embedder>, text: &str) -> Result<Self, ToolSourceError> {
        Self::build(embedder, chunk_manual(text)).await
    }

    /// Reads the export at `path` and indexes it.
    pub async fn load(
        embedder: Arc<dyn Embedder>,
        path: impl AsRef<Path>,
    ) -> Result<Self, ToolSourceError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ToolSourceError::InvalidInput(format!("{}: {}", path.display(), e)))?;
        let index = Self::from_text(embedder, &text).await?;
        info!(path = %path.display(), chunks = index.len(), "manual indexed");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cosine similarity; 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

#[async_trait]
impl ManualIndex for VectorManualIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ManualHit>, ToolSourceError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(vec![]);
        }
        let query_vector = self
            .embedder
            .embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ToolSourceError::Transport("embedder returned no vector".into()))?;
        let mut hits: Vec<ManualHit> = self
            .entries
            .iter()
            .map(|(chunk, v)| ManualHit {
                page: chunk.page,
                text: chunk.text.clone(),
                score: cosine_similarity(&query_vector, v),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Bag-of-words embedder: each lowercase word bumps one hashed bucket.
    pub(crate) struct WordEmbedder;

    #[async_trait]
    impl Embedder for WordEmbedder {
        async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ToolSourceError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0f32; 64];
                    for word in t.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
                        let h = word
                            .to_lowercase()
                            .bytes()
                            .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
                        v[h % 64] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    const MANUAL: &str = "Seats and restraints. Adjust the head restraint.\u{c}\
        Fuse 33 15A trailer brake controller.\u{c}\
        Tire pressure 35 psi cold front and rear.";

    /// **Scenario**: The chunk sharing the query's words ranks first.
    #[tokio::test]
    async fn search_ranks_matching_page_first() {
        let index = VectorManualIndex::from_text(Arc::new(WordEmbedder), MANUAL)
            .await
            .unwrap();
        assert_eq!(index.len(), 3);
        let hits = index.search("fuse 33", 5).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].page, 2);
        assert!(hits[0].score > hits[1].score);
    }

    /// **Scenario**: k bounds the number of hits; an empty index returns none.
    #[tokio::test]
    async fn search_respects_k_and_empty() {
        let index = VectorManualIndex::from_text(Arc::new(WordEmbedder), MANUAL)
            .await
            .unwrap();
        assert_eq!(index.search("tire", 1).await.unwrap().len(), 1);
        let empty = VectorManualIndex::from_text(Arc::new(WordEmbedder), "")
            .await
            .unwrap();
        assert!(empty.is_empty());
        assert!(empty.search("tire", 5).await.unwrap().is_empty());
    }

    /// **Scenario**: Loading a missing file is InvalidInput.
    #[tokio::test]
    async fn load_missing_file() {
        let result = VectorManualIndex::load(Arc::new(WordEmbedder), "/nonexistent/manual.txt").await;
        assert!(matches!(result, Err(ToolSourceError::InvalidInput(_))));
    }

    /// **Scenario**: Cosine similarity of zero vectors is 0.
    #[test]
    fn cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
