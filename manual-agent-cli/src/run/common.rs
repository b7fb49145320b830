//! Shared run logic: checkpointer, tool registry and the session summary.
//!
//! Used by [`build_runner`](super::build_runner) and by tests that inject
//! MockLlm/MockToolSource.

use std::sync::Arc;

use manual_agent::{Checkpointer, MemorySaver, SearchWebTool, Tool, ToolRegistry, TurnState};
use tracing::{info, warn};

use crate::config::{Error, RunConfig};

/// Session store: SQLite at `db_path` when set (feature `sqlite`), otherwise in memory.
pub(crate) fn build_checkpointer(
    config: &RunConfig,
) -> Result<Arc<dyn Checkpointer<TurnState>>, Error> {
    match config.db_path.as_deref() {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            let saver = manual_agent::SqliteSaver::<TurnState>::new(
                path,
                Arc::new(manual_agent::JsonSerializer),
            )?;
            info!(path, "sessions persisted to sqlite");
            Ok(Arc::new(saver))
        }
        #[cfg(not(feature = "sqlite"))]
        Some(path) => {
            warn!(path, "built without sqlite; sessions kept in memory");
            Ok(Arc::new(MemorySaver::<TurnState>::new()))
        }
        None => Ok(Arc::new(MemorySaver::<TurnState>::new())),
    }
}

/// Registry with `search_manual` (given) and `search_web` (Brave key from config).
pub(crate) fn build_registry(config: &RunConfig, search_manual: Arc<dyn Tool>) -> ToolRegistry {
    let web = SearchWebTool::new(config.brave_api_key.clone());
    if !web.is_configured() {
        warn!("BRAVE_API_KEY not set; search_web will report it is not configured");
    }
    let mut registry = ToolRegistry::new();
    registry.register(search_manual).register(Arc::new(web));
    registry
}

/// Text printed when the user leaves: cumulative usage and interactions for the session.
pub fn session_summary(state: &TurnState) -> String {
    let usage = &state.usage;
    let rule = "=".repeat(70);
    [
        format!("\n{}", rule),
        "SESSION SUMMARY".to_string(),
        rule.clone(),
        format!("Total tokens used: {}", usage.total_tokens),
        format!("  Prompt tokens: {}", usage.prompt_tokens),
        format!("  Completion tokens: {}", usage.completion_tokens),
        format!("Total interactions: {}", state.interactions()),
        format!("Final context usage: {:.1}%", usage.percent()),
        format!("Remaining tokens: {}", usage.remaining()),
        rule,
    ]
    .join("\n")
}
