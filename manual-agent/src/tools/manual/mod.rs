//! `search_manual`: semantic search over the owner's manual.
//!
//! The manual is a plain-text export (pages separated by form feeds) chunked and embedded
//! into a [`VectorManualIndex`], usually wrapped in an [`AgenticManualIndex`] that lets the
//! model rewrite queries and filter hits. The tool returns the top sections with their page
//! numbers.

mod agentic;
mod chunk;
mod embedder;
mod index;

pub use agentic::{clean_rewrite, AgenticManualIndex, MIN_RELEVANT_HITS, RETRY_TOP_K, TRUSTED_HITS};
pub use chunk::{chunk_manual, chunk_text, split_pages, ManualChunk, CHUNK_OVERLAP, CHUNK_SIZE};
pub use embedder::Embedder;
#[cfg(feature = "openai")]
pub use embedder::OpenAIEmbedder;
pub use index::{ManualHit, ManualIndex, VectorManualIndex};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

/// Tool name for manual search.
pub const TOOL_SEARCH_MANUAL: &str = "search_manual";

/// Sections returned per search.
pub const SEARCH_TOP_K: usize = 5;

/// Text returned when the tool is called before a manual was loaded.
pub const MANUAL_NOT_LOADED: &str = "Error: Manual not loaded. Please restart the application.";

/// Searches the owner's manual.
///
/// Without an index the tool still registers, so the model sees it, and answers every call
/// with [`MANUAL_NOT_LOADED`].
pub struct SearchManualTool {
    index: Option<Arc<dyn ManualIndex>>,
    domain: String,
}

impl SearchManualTool {
    pub fn new(index: Arc<dyn ManualIndex>, domain: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            domain: domain.into(),
        }
    }

    pub fn unloaded(domain: impl Into<String>) -> Self {
        Self {
            index: None,
            domain: domain.into(),
        }
    }
}

fn format_hits(domain: &str, hits: &[ManualHit]) -> String {
    let mut out = vec![format!(
        "Here are the relevant sections from the {} Owner's Manual:\n",
        domain
    )];
    for (i, hit) in hits.iter().enumerate() {
        out.push(format!("\n[Section {} - Page {}]", i + 1, hit.page));
        out.push(hit.text.trim().to_string());
        out.push("-".repeat(50));
    }
    out.join("\n")
}

#[async_trait]
impl Tool for SearchManualTool {
    fn name(&self) -> &str {
        TOOL_SEARCH_MANUAL
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SEARCH_MANUAL.to_string(),
            description: Some(format!(
                "Search the {} Owner's Manual. Use for fuse locations and purposes, vehicle \
                 features and controls, maintenance procedures, specifications and capacities, \
                 safety systems and troubleshooting.",
                self.domain
            )),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question or topic to search for in the manual."
                    }
                },
                "required": ["question"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let question = args
            .get("question")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing question".to_string()))?;

        let Some(index) = &self.index else {
            return Ok(ToolCallContent {
                text: MANUAL_NOT_LOADED.to_string(),
            });
        };

        let hits = index.search(question, SEARCH_TOP_K).await?;
        debug!(question, hits = hits.len(), "manual search");
        let text = if hits.is_empty() {
            "No relevant information found in the manual for this question.".to_string()
        } else {
            format_hits(&self.domain, &hits)
        };
        Ok(ToolCallContent { text })
    }
}

#[cfg(test)]
mod tests {
    use super::index::tests::WordEmbedder;
    use super::*;

    async fn tool() -> SearchManualTool {
        let index = VectorManualIndex::from_text(
            Arc::new(WordEmbedder),
            "Lighting\u{c}Fuse 33 15A trailer brake controller.",
        )
        .await
        .unwrap();
        SearchManualTool::new(Arc::new(index), "2018 Ford F-150")
    }

    /// **Scenario**: Results are formatted with section numbers and pages, best match first.
    #[tokio::test]
    async fn formats_sections_with_pages() {
        let out = tool()
            .await
            .call(json!({"question": "fuse 33"}))
            .await
            .unwrap()
            .text;
        assert!(out.starts_with("Here are the relevant sections from the 2018 Ford F-150 Owner's Manual:"));
        assert!(out.contains("[Section 1 - Page 2]\nFuse 33 15A trailer brake controller."));
        assert!(out.contains("[Section 2 - Page 1]"));
    }

    /// **Scenario**: A missing or blank question is InvalidInput.
    #[tokio::test]
    async fn missing_question_is_invalid_input() {
        let t = tool().await;
        assert!(matches!(t.call(json!({})).await, Err(ToolSourceError::InvalidInput(_))));
        assert!(matches!(
            t.call(json!({"question": "  "})).await,
            Err(ToolSourceError::InvalidInput(_))
        ));
    }

    /// **Scenario**: Without a manual the tool explains that it is not loaded.
    #[tokio::test]
    async fn unloaded_manual_message() {
        let t = SearchManualTool::unloaded("2018 Ford F-150");
        let out = t.call(json!({"question": "fuse 33"})).await.unwrap();
        assert_eq!(out.text, MANUAL_NOT_LOADED);
        assert_eq!(t.spec().input_schema["required"][0], "question");
    }
}
