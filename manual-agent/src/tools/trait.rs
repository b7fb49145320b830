//! Single callable tool.

use async_trait::async_trait;
use serde_json::Value;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// One tool: a name, the spec shown to the model and the call itself.
///
/// **Interaction**: Registered in `ToolRegistry`, which lists specs and dispatches
/// `call_tool` by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    /// Runs the tool. Missing or malformed arguments are `InvalidInput`; failures of the
    /// backing service are `Transport`.
    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError>;
}
