//! Run entry points: build the turn runner from config, run one turn.
//!
//! Re-exports [`build_runner`], [`build_runner_with`], [`run_turn`], [`session_summary`] and
//! [`Error`].

pub use crate::config::Error;

mod common;

use std::sync::Arc;

use manual_agent::{LlmClient, ToolApprover, ToolSource, TurnRunner};

use crate::config::RunConfig;

pub use common::session_summary;

/// Builds the runner for `config` with real collaborators: Ollama chat and embeddings,
/// the manual index (when `manual_path` is set) behind LLM-assisted retrieval, Brave search
/// and the session store.
///
/// A manual that cannot be loaded is logged and `search_manual` answers that the manual is
/// not loaded; the assistant still starts.
#[cfg(feature = "openai")]
pub async fn build_runner(config: &RunConfig) -> Result<TurnRunner, Error> {
    use manual_agent::tools::manual::{AgenticManualIndex, OpenAIEmbedder, VectorManualIndex};
    use manual_agent::{ChatOpenAI, SearchManualTool, Tool};
    use tracing::{info, warn};

    let search_manual: Arc<dyn Tool> = match &config.manual_path {
        Some(path) => {
            info!(path = %path, model = %config.embedding_model, "indexing manual");
            let embedder = OpenAIEmbedder::ollama(
                &config.ollama_host,
                config.ollama_port,
                config.embedding_model.clone(),
            );
            match VectorManualIndex::load(Arc::new(embedder), path).await {
                Ok(index) => {
                    // Retrieval gets its own deterministic client without tools.
                    let retrieval_llm = ChatOpenAI::ollama(
                        &config.ollama_host,
                        config.ollama_port,
                        config.model.clone(),
                    )
                    .with_temperature(0.0);
                    let agentic = AgenticManualIndex::new(
                        Arc::new(index),
                        Arc::new(retrieval_llm),
                        config.domain.clone(),
                    );
                    Arc::new(SearchManualTool::new(Arc::new(agentic), config.domain.clone()))
                }
                Err(e) => {
                    warn!(error = %e, "manual could not be loaded");
                    Arc::new(SearchManualTool::unloaded(config.domain.clone()))
                }
            }
        }
        None => {
            warn!("MANUAL_PATH not set; search_manual will report the manual is not loaded");
            Arc::new(SearchManualTool::unloaded(config.domain.clone()))
        }
    };

    let registry = common::build_registry(config, search_manual);
    let specs = registry.list_tools().await?;
    let llm = ChatOpenAI::ollama(&config.ollama_host, config.ollama_port, config.model.clone())
        .with_tools(specs)
        .with_temperature(config.temperature);

    let approver: Option<Arc<dyn ToolApprover>> = if config.approve_tools {
        Some(Arc::new(crate::StdinApprover))
    } else {
        None
    };
    build_runner_with(Box::new(llm), Box::new(registry), approver, config)
}

/// Builds the runner for `config` with the given collaborators. Used by [`build_runner`]
/// and by tests with MockLlm/MockToolSource.
pub fn build_runner_with(
    llm: Box<dyn LlmClient>,
    tool_source: Box<dyn ToolSource>,
    approver: Option<Arc<dyn ToolApprover>>,
    config: &RunConfig,
) -> Result<TurnRunner, Error> {
    let checkpointer = common::build_checkpointer(config)?;
    let runner = TurnRunner::new(
        llm,
        tool_source,
        approver,
        Some(checkpointer),
        Some(config.runnable_config()),
        config.to_turn_options(),
    )?;
    Ok(runner)
}

/// Runs one turn and returns the assistant's reply.
pub async fn run_turn(runner: &TurnRunner, user_message: &str) -> Result<String, Error> {
    let state = runner.invoke(user_message).await?;
    Ok(state.final_reply().unwrap_or_default().to_string())
}
