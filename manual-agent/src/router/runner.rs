//! Turn runner: builds the router graph once and runs one user message per `invoke`.
//!
//! Used by manual-agent-cli and the integration tests. Interacts with
//! [`StateGraph`](crate::graph::StateGraph), [`PreFilterNode`](super::PreFilterNode),
//! [`ReasonNode`](super::ReasonNode), [`ApprovalNode`](super::ApprovalNode),
//! [`ToolsNode`](super::ToolsNode), [`UsageNode`](super::UsageNode) and
//! [`build_initial_state`].

use std::sync::Arc;

use tracing::debug;

use crate::error::AgentError;
use crate::graph::{
    CompilationError, CompiledStateGraph, LoggingNodeMiddleware, StateGraph,
    DEFAULT_RECURSION_LIMIT, END, START,
};
use crate::llm::LlmClient;
use crate::memory::{CheckpointError, Checkpointer, RunnableConfig};
use crate::state::{TurnState, UsageCounters, DEFAULT_CONTEXT_LIMIT, DEFAULT_WARNING_THRESHOLD};
use crate::tool_source::ToolSource;

use super::{
    system_prompt, ApprovalNode, HandleToolErrors, PreFilterNode, ReasonNode, ToolApprover,
    ToolsNode, UsageNode, DEFAULT_DOMAIN, DEFAULT_MAX_TOOL_ROUNDS, NODE_APPROVAL, NODE_PREFILTER,
    NODE_REASON, NODE_TOOLS, NODE_USAGE,
};

/// Builds the state for one turn: the latest checkpoint for the thread (when a checkpointer
/// and a config with thread_id are present) or a fresh session with `system_prompt` and
/// `counters`. The user message is appended and per-turn fields are reset.
///
/// # Errors
///
/// Returns `CheckpointError` if loading from checkpoint fails.
pub async fn build_initial_state(
    user_message: &str,
    checkpointer: Option<&dyn Checkpointer<TurnState>>,
    runnable_config: Option<&RunnableConfig>,
    system_prompt: &str,
    counters: UsageCounters,
) -> Result<TurnState, CheckpointError> {
    let mut state = match (checkpointer, runnable_config) {
        (Some(cp), Some(config)) if config.thread_id.is_some() => {
            match cp.get_tuple(config).await? {
                Some((checkpoint, _)) => checkpoint.channel_values,
                None => TurnState::new(system_prompt, counters),
            }
        }
        _ => TurnState::new(system_prompt, counters),
    };
    state.begin_turn(user_message);
    Ok(state)
}

/// Error type for TurnRunner operations.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("execution failed: {0}")]
    Execution(#[from] AgentError),
}

/// Router settings that do not come with a collaborator.
#[derive(Clone, Debug)]
pub struct TurnOptions {
    /// Product named in the persona and canned replies.
    pub domain: String,
    /// Overrides the persona built from `domain`.
    pub system_prompt: Option<String>,
    pub max_tool_rounds: u32,
    pub context_limit: u64,
    pub warning_threshold: f64,
    /// Lower bound on graph steps per turn; raised as needed so `max_tool_rounds` is reachable.
    pub recursion_limit: usize,
    /// Attach node enter/exit logging.
    pub verbose: bool,
    pub handle_tool_errors: HandleToolErrors,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            system_prompt: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            verbose: false,
            handle_tool_errors: HandleToolErrors::Never,
        }
    }
}

impl TurnOptions {
    fn prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| system_prompt(&self.domain))
    }

    fn counters(&self) -> UsageCounters {
        UsageCounters::new(self.context_limit, self.warning_threshold)
    }
}

/// Node steps of a turn that uses all `max_tool_rounds`: prefilter, reason and usage, plus
/// reason and tools (and approval when gated) per round. Hitting the tool-round cap takes
/// no more steps than this.
fn steps_needed(max_tool_rounds: u32, gated: bool) -> usize {
    let per_round = if gated { 3 } else { 2 };
    3 + per_round * max_tool_rounds as usize
}

/// Router runner: compiled graph plus persistence config.
///
/// # Example
///
/// ```ignore
/// let runner = TurnRunner::new(llm, tools, None, Some(checkpointer), Some(config), TurnOptions::default())?;
/// let state = runner.invoke("what is fuse 33 for?").await?;
/// println!("{}", state.final_reply().unwrap_or_default());
/// ```
pub struct TurnRunner {
    compiled: CompiledStateGraph<TurnState>,
    checkpointer: Option<Arc<dyn Checkpointer<TurnState>>>,
    runnable_config: Option<RunnableConfig>,
    options: TurnOptions,
}

impl TurnRunner {
    /// Builds and compiles the router graph. With an `approver`, tool requests pass through
    /// the approval gate before execution.
    pub fn new(
        llm: Box<dyn LlmClient>,
        tool_source: Box<dyn ToolSource>,
        approver: Option<Arc<dyn ToolApprover>>,
        checkpointer: Option<Arc<dyn Checkpointer<TurnState>>>,
        runnable_config: Option<RunnableConfig>,
        options: TurnOptions,
    ) -> Result<Self, CompilationError> {
        let prefilter = PreFilterNode::new(options.domain.clone());
        let reason = ReasonNode::new(llm).with_max_tool_rounds(options.max_tool_rounds);
        let tools = ToolsNode::new(tool_source)
            .with_handle_tool_errors(options.handle_tool_errors.clone());
        let usage = UsageNode::new(options.context_limit, options.warning_threshold);

        let after_reason = if approver.is_some() {
            NODE_APPROVAL
        } else {
            NODE_TOOLS
        };
        let recursion_limit = options.recursion_limit.max(steps_needed(
            options.max_tool_rounds,
            approver.is_some(),
        ));

        let mut graph = StateGraph::<TurnState>::new();
        graph
            .add_node(NODE_PREFILTER, Arc::new(prefilter))
            .add_node(NODE_REASON, Arc::new(reason))
            .add_node(NODE_TOOLS, Arc::new(tools))
            .add_node(NODE_USAGE, Arc::new(usage))
            .add_edge(START, NODE_PREFILTER)
            .add_conditional_edges(
                NODE_PREFILTER,
                |s: &TurnState| {
                    let to = if s.bypassed { END } else { NODE_REASON };
                    to.to_string()
                },
                [END, NODE_REASON],
            )
            .add_conditional_edges(
                NODE_REASON,
                move |s: &TurnState| {
                    let to = if s.pending_tool_calls().is_empty() {
                        NODE_USAGE
                    } else {
                        after_reason
                    };
                    to.to_string()
                },
                [after_reason, NODE_USAGE],
            )
            .add_edge(NODE_TOOLS, NODE_REASON)
            .add_edge(NODE_USAGE, END);

        if let Some(approver) = approver {
            graph
                .add_node(NODE_APPROVAL, Arc::new(ApprovalNode::new(approver)))
                .add_conditional_edges(
                    NODE_APPROVAL,
                    |s: &TurnState| {
                        let to = if s.pending_tool_calls().is_empty() {
                            NODE_REASON
                        } else {
                            NODE_TOOLS
                        };
                        to.to_string()
                    },
                    [NODE_TOOLS, NODE_REASON],
                );
        }

        debug!(recursion_limit, "router graph step limit");
        let mut graph = graph.with_recursion_limit(recursion_limit);
        if options.verbose {
            graph = graph.with_middleware(Arc::new(LoggingNodeMiddleware::<TurnState>::default()));
        }

        let compiled = match &checkpointer {
            Some(cp) => graph.compile_with_checkpointer(Arc::clone(cp))?,
            None => graph.compile()?,
        };

        Ok(Self {
            compiled,
            checkpointer,
            runnable_config,
            options,
        })
    }

    /// Runs one turn for `user_message` and returns the session state after it.
    ///
    /// On success the state is checkpointed (when configured); on failure nothing is saved.
    pub async fn invoke(&self, user_message: &str) -> Result<TurnState, RunError> {
        let state = build_initial_state(
            user_message,
            self.checkpointer.as_deref(),
            self.runnable_config.as_ref(),
            &self.options.prompt(),
            self.options.counters(),
        )
        .await?;
        debug!(history = state.messages.len(), "turn start");
        let final_state = self
            .compiled
            .invoke(state, self.runnable_config.clone())
            .await?;
        Ok(final_state)
    }

    /// Latest persisted state of the configured session, if any.
    pub async fn load_session(&self) -> Result<Option<TurnState>, RunError> {
        match (&self.checkpointer, &self.runnable_config) {
            (Some(cp), Some(config)) if config.thread_id.is_some() => Ok(cp
                .get_tuple(config)
                .await?
                .map(|(checkpoint, _)| checkpoint.channel_values)),
            _ => Ok(None),
        }
    }

    pub fn options(&self) -> &TurnOptions {
        &self.options
    }
}
