//! Tools the assistant can call, and the registry that exposes them as a `ToolSource`.
//!
//! - [`SearchManualTool`] (`search_manual`): semantic search over the owner's manual.
//! - [`SearchWebTool`] (`search_web`): Brave web search.

pub mod manual;
mod registry;
mod r#trait;
pub mod web;

pub use manual::{SearchManualTool, TOOL_SEARCH_MANUAL};
pub use r#trait::Tool;
pub use registry::ToolRegistry;
pub use web::{SearchWebTool, TOOL_SEARCH_WEB};
