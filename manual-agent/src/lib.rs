//! # manual-agent
//!
//! An owner's-manual assistant built around a **turn router**: a small state graph that takes
//! one user message through a pre-filter, an LLM reasoning stage, a tool-execution loop and a
//! token-accounting stage. The whole session is one `TurnState` value flowing through the
//! nodes and persisted by a checkpointer between turns.
//!
//! ## Turn flow
//!
//! ```text
//! START → prefilter ─(pleasantry)──────────────────────────────→ END
//!             └──────→ reason ─(tool calls)→ [approval] → tools ─┐
//!                        ▲  └─(answer)→ usage → END              │
//!                        └────────────────────────────────────────┘
//! ```
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `Next`, conditional edges and
//!   node middleware.
//! - [`router`]: the router nodes (`PreFilterNode`, `ReasonNode`, `ApprovalNode`,
//!   `ToolsNode`, `UsageNode`) and `TurnRunner`, which wires them.
//! - [`llm`]: `LlmClient` trait, `MockLlm`, and `ChatOpenAI` for OpenAI-compatible servers
//!   such as Ollama (feature `openai`).
//! - [`memory`]: `Checkpointer` trait, `MemorySaver`, and `SqliteSaver` (feature `sqlite`).
//! - [`tool_source`]: `ToolSource` trait and `MockToolSource`.
//! - [`tools`]: `ToolRegistry`, `search_manual` (vector search over the owner's manual) and
//!   `search_web` (Brave Search).
//!
//! ## Features
//!
//! - `openai` (default): chat completions and embeddings via `async-openai`.
//! - `sqlite` (default): persistent checkpointer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use manual_agent::{MockLlm, MockToolSource, TurnOptions, TurnRunner};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let runner = TurnRunner::new(
//!     Box::new(MockLlm::with_no_tool_calls("Fuse 33 protects the trailer brake controller.")),
//!     Box::new(MockToolSource::manual_and_web()),
//!     None,
//!     None,
//!     None,
//!     TurnOptions::default(),
//! )
//! .unwrap();
//! let state = runner.invoke("what is fuse 33 for?").await.unwrap();
//! println!("{}", state.final_reply().unwrap_or_default());
//! # }
//! ```

pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod router;
pub mod state;
pub mod tool_source;
pub mod tools;

pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, LoggingNodeMiddleware, Next, Node, NodeMiddleware,
    StateGraph, END, START,
};
pub use llm::{LlmClient, LlmResponse, MockLlm};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource,
    Checkpointer, JsonSerializer, MemorySaver, RunnableConfig,
};
#[cfg(feature = "sqlite")]
pub use memory::SqliteSaver;
pub use message::{AssistantMessage, Message, ToolMessage, Usage};
pub use router::{
    ApprovalDecision, HandleToolErrors, RunError, ToolApprover, TurnOptions, TurnRunner,
    DEFAULT_DOMAIN,
};
pub use state::{ToolCall, TurnState, UsageCounters, UsageLevel};
pub use tool_source::{MockToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec};
pub use tools::{SearchManualTool, SearchWebTool, Tool, ToolRegistry};
