//! Human-in-the-loop approval on the terminal.
//!
//! [`StdinApprover`] implements manual-agent's `ToolApprover`: it prints the requested calls
//! and reads a y/n answer from stdin.

use std::io::Write;

use async_trait::async_trait;
use manual_agent::{ApprovalDecision, ToolApprover, ToolCall};
use serde_json::Value;
use tracing::warn;

/// Longest argument value shown in an approval request.
const MAX_ARG_DISPLAY: usize = 100;

fn rule() -> String {
    "=".repeat(70)
}

fn truncate(value: &str) -> String {
    if value.chars().count() > MAX_ARG_DISPLAY {
        format!("{}...", value.chars().take(MAX_ARG_DISPLAY).collect::<String>())
    } else {
        value.to_string()
    }
}

/// Formats the approval request for a batch of tool calls.
pub fn format_approval_prompt(calls: &[ToolCall]) -> String {
    let mut lines = vec![format!("\n{}", rule()), "TOOL APPROVAL REQUEST".to_string(), rule()];
    for (i, call) in calls.iter().enumerate() {
        lines.push(format!("\n[{}] Tool: {}", i + 1, call.name));
        lines.push("    Arguments:".to_string());
        match serde_json::from_str::<Value>(&call.arguments) {
            Ok(Value::Object(args)) => {
                for (key, value) in args {
                    let shown = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    lines.push(format!("      {}: {}", key, truncate(&shown)));
                }
            }
            _ => lines.push(format!("      {}", truncate(&call.arguments))),
        }
    }
    lines.push(format!("\n{}", rule()));
    lines.push(format!(
        "Approve execution of these {} tool(s)? (y/n): ",
        calls.len()
    ));
    lines.join("\n")
}

/// `y` / `yes` (any case) approves; anything else rejects.
pub fn parse_answer(answer: &str) -> ApprovalDecision {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => ApprovalDecision::Approved,
        _ => ApprovalDecision::Rejected,
    }
}

/// Reads one line from stdin without blocking the runtime. `None` at end of input.
pub async fn read_stdin_line() -> std::io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let n = std::io::stdin().read_line(&mut line)?;
        Ok(if n == 0 { None } else { Some(line) })
    })
    .await
    .map_err(std::io::Error::other)?
}

/// Asks on the terminal before any tool runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinApprover;

#[async_trait]
impl ToolApprover for StdinApprover {
    async fn review(&self, calls: &[ToolCall]) -> ApprovalDecision {
        print!("{}", format_approval_prompt(calls));
        let _ = std::io::stdout().flush();
        match read_stdin_line().await {
            Ok(Some(answer)) => {
                let decision = parse_answer(&answer);
                if decision == ApprovalDecision::Rejected {
                    println!("Tools rejected; the assistant will answer without them.");
                }
                decision
            }
            Ok(None) => ApprovalDecision::Rejected,
            Err(e) => {
                warn!(error = %e, "could not read approval answer");
                ApprovalDecision::Rejected
            }
        }
    }
}
