//! LLM-assisted retrieval over a [`ManualIndex`].
//!
//! A search first asks the model to rewrite the question into a short keyword query, runs it
//! against the inner index and keeps the hits. When fewer than [`MIN_RELEVANT_HITS`] survive
//! and the query was rewritten, the original question is searched again with a wider
//! [`RETRY_TOP_K`] and the model judges each hit. Model failures never fail the search: a
//! failed rewrite keeps the question, a failed judgement keeps the hit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::message::Message;
use crate::tool_source::ToolSourceError;

use super::index::{ManualHit, ManualIndex};

/// Below this many relevant hits the original question is searched again.
pub const MIN_RELEVANT_HITS: usize = 2;

/// Hits fetched by the retry with the original question.
pub const RETRY_TOP_K: usize = 8;

/// Up to this many hits are trusted as ranked; larger sets are judged by the model.
pub const TRUSTED_HITS: usize = 5;

/// Most hits sent to the model for judgement.
const MAX_JUDGED: usize = 10;

/// Excerpt length (chars) shown to the model when judging a hit.
const EXCERPT_CHARS: usize = 500;

const PREAMBLES: [&str; 4] = [
    "here's a reformulated query:",
    "here is the reformulated query:",
    "reformulated query:",
    "reformulated:",
];

fn rewrite_prompt(domain: &str, question: &str) -> String {
    format!(
        "Rewrite this question as a search query for the {domain} Owner's Manual.\n\n\
         Rules:\n\
         1. Reply with the query text only, no explanation.\n\
         2. Leave out the vehicle make and model; every page is about it already.\n\
         3. Keep component and feature names and the attributes asked about.\n\
         4. Drop conversational words such as \"what\", \"how\" and \"please\".\n\
         5. Use at most 10 words.\n\n\
         Examples:\n\
         - \"What is fuse 33 for?\" -> \"fuse 33 purpose amperage\"\n\
         - \"How do I reset the oil light?\" -> \"oil change indicator reset procedure\"\n\
         - \"Where is the spare tire?\" -> \"spare tire location access\"\n\n\
         Question: \"{question}\"\n\
         Query:"
    )
}

fn judge_prompt(question: &str, excerpt: &str) -> String {
    format!(
        "Is this manual excerpt relevant to the question?\n\n\
         Question: \"{question}\"\n\n\
         Excerpt: \"{excerpt}\"\n\n\
         Answer only YES or NO:"
    )
}

/// Trims the model's rewrite, drops a leading "reformulated query:"-style preamble and
/// surrounding quotes. Returns `None` when nothing is left.
pub fn clean_rewrite(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let text = PREAMBLES
        .iter()
        .find(|p| {
            trimmed
                .get(..p.len())
                .map_or(false, |head| head.eq_ignore_ascii_case(p))
        })
        .map_or(trimmed, |p| trimmed[p.len()..].trim());
    let text = text.trim_matches(|c: char| c == '"' || c == '\'').trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Retrieval layer that lets a model rewrite queries and filter hits.
///
/// **Interaction**: Implements `ManualIndex` over another `ManualIndex` (usually
/// `VectorManualIndex`); `SearchManualTool` uses it like any index.
pub struct AgenticManualIndex {
    inner: Arc<dyn ManualIndex>,
    llm: Arc<dyn LlmClient>,
    domain: String,
}

impl AgenticManualIndex {
    pub fn new(
        inner: Arc<dyn ManualIndex>,
        llm: Arc<dyn LlmClient>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            llm,
            domain: domain.into(),
        }
    }

    async fn ask(&self, prompt: String) -> Option<String> {
        match self.llm.invoke(&[Message::user(prompt)]).await {
            Ok(response) => Some(response.content),
            Err(e) => {
                warn!(error = %e, "retrieval model call failed");
                None
            }
        }
    }

    /// Keyword query for `question`, or the question itself when the model gives nothing usable.
    pub async fn rewrite(&self, question: &str) -> String {
        self.ask(rewrite_prompt(&self.domain, question))
            .await
            .and_then(|raw| clean_rewrite(&raw))
            .unwrap_or_else(|| question.to_string())
    }

    /// Hits the model considers relevant to `question`, at most [`TRUSTED_HITS`].
    pub async fn judge(&self, question: &str, hits: Vec<ManualHit>) -> Vec<ManualHit> {
        if hits.len() <= TRUSTED_HITS {
            return hits;
        }
        let mut relevant = Vec::new();
        for hit in hits.into_iter().take(MAX_JUDGED) {
            let excerpt: String = hit.text.chars().take(EXCERPT_CHARS).collect();
            let keep = match self.ask(judge_prompt(question, &excerpt)).await {
                Some(answer) => answer.to_lowercase().contains("yes"),
                None => true,
            };
            if keep {
                relevant.push(hit);
            }
        }
        relevant.truncate(TRUSTED_HITS);
        relevant
    }
}

#[async_trait]
impl ManualIndex for AgenticManualIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ManualHit>, ToolSourceError> {
        let rewritten = self.rewrite(query).await;
        if rewritten != query {
            debug!(query, rewritten = %rewritten, "query rewritten");
        }

        let hits = self.inner.search(&rewritten, k).await?;
        let mut relevant = self.judge(query, hits).await;
        debug!(relevant = relevant.len(), "first retrieval pass");

        if relevant.len() < MIN_RELEVANT_HITS && rewritten != query {
            let hits = self.inner.search(query, RETRY_TOP_K).await?;
            relevant = self.judge(query, hits).await;
            debug!(relevant = relevant.len(), "retry with original question");
        }
        Ok(relevant)
    }
}
