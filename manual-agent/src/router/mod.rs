//! Turn router: the graph one user message travels through.
//!
//! `prefilter → reason → (tools ↔ reason) → usage → END`, with `prefilter → END` for
//! pleasantries and an optional `approval` node between reason and tools. Every node
//! implements `Node<TurnState>`; branching lives in the conditional edges built by
//! [`TurnRunner`].

mod approval_node;
mod prefilter;
mod reason_node;
mod runner;
mod tools_node;
mod usage_node;

pub use approval_node::{
    ApprovalDecision, ApprovalNode, ToolApprover, REJECTION_MESSAGE, TOOL_NOT_APPROVED,
};
pub use prefilter::{classify, Classification, Pleasantry, PreFilterNode};
pub use reason_node::{ReasonNode, DEFAULT_MAX_TOOL_ROUNDS};
pub use runner::{build_initial_state, RunError, TurnOptions, TurnRunner};
pub use tools_node::{
    ErrorHandlerFn, HandleToolErrors, ToolsNode, DEFAULT_EXECUTION_ERROR_TEMPLATE,
};
pub use usage_node::{progress_bar, usage_warning, UsageNode};

/// Node id of the pre-filter.
pub const NODE_PREFILTER: &str = "prefilter";
/// Node id of the reasoning stage.
pub const NODE_REASON: &str = "reason";
/// Node id of the approval gate.
pub const NODE_APPROVAL: &str = "approval";
/// Node id of the tool-execution stage.
pub const NODE_TOOLS: &str = "tools";
/// Node id of the usage-accounting stage.
pub const NODE_USAGE: &str = "usage";

/// Domain used for the persona and canned replies unless configured otherwise.
pub const DEFAULT_DOMAIN: &str = "2018 Ford F-150";

/// System prompt for the owner's-manual expert on `domain`.
pub fn system_prompt(domain: &str) -> String {
    format!(
        r#"You are an expert on the {domain} with master's level knowledge of its owner's manual.

You have access to TWO search tools:
1. search_manual - Search the official {domain} Owner's Manual
2. search_web - Search the web for current information and real-world knowledge

Help users understand their {domain}: vehicle features and controls, maintenance schedules and procedures, safety systems and warnings, specifications and capacities, troubleshooting, fuse locations and purposes, audio, climate and infotainment systems.

TOOL USAGE RULES:
1. Do not call tools for greetings, thanks, acknowledgments, farewells or off-topic questions. Respond directly.
2. Call tools only when the user has a specific question about the {domain} that needs information.

Use search_manual for specifications and capacities, operating procedures, feature explanations, fuse diagrams, maintenance schedules and official safety guidance.
Use search_web for known issues, recalls and service bulletins, real-world troubleshooting tips, community solutions and anything the manual does not cover.
For problems, start with the manual, then search the web, and combine both.

When answering:
- Provide detailed information and cite your sources.
- Reference page numbers from manual searches.
- Distinguish official manual guidance from web-sourced information.
- Include relevant safety warnings.

Always prioritize user safety and proper vehicle operation."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: The prompt names the domain and both tools.
    #[test]
    fn system_prompt_mentions_domain_and_tools() {
        let p = system_prompt("2019 Ram 1500");
        assert!(p.starts_with("You are an expert on the 2019 Ram 1500"));
        assert!(p.contains("search_manual"));
        assert!(p.contains("search_web"));
        assert!(!p.contains("F-150"));
    }
}
