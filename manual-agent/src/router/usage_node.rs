//! Usage-accounting node: fold the final answer's token counts into the session totals.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::{RecordOutcome, TurnState, UsageLevel};

use super::NODE_USAGE;

const BAR_WIDTH: usize = 40;

/// Renders `percent` as `[████----...] 42.0% (LOW)`, 40 cells wide.
pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).clamp(0.0, BAR_WIDTH as f64) as usize;
    let label = if percent < 50.0 {
        "LOW"
    } else if percent < 80.0 {
        "MEDIUM"
    } else {
        "HIGH"
    };
    format!(
        "[{}{}] {:.1}% ({})",
        "█".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent,
        label
    )
}

/// Text of the system message appended when `level` is crossed for the first time.
pub fn usage_warning(level: UsageLevel, percent: f64, remaining: u64) -> String {
    match level {
        UsageLevel::Critical => format!(
            "CRITICAL: Context nearly full ({:.1}%, {} tokens remaining). Consider starting a new conversation.",
            percent, remaining
        ),
        UsageLevel::High => format!(
            "WARNING: Context usage is high ({:.1}%, {} tokens remaining).",
            percent, remaining
        ),
        UsageLevel::Moderate => format!(
            "Context usage is moderate ({:.1}%, {} tokens remaining).",
            percent, remaining
        ),
    }
}

/// Accounting stage.
///
/// **Interaction**: Implements `Node<TurnState>`. Reads the usage of the newest assistant
/// message, records it in `TurnState::usage` (once per message id) and appends a system
/// warning for each threshold crossed for the first time. Missing usage is skipped; this
/// node never fails.
pub struct UsageNode {
    context_limit: u64,
    warning_threshold: f64,
}

impl UsageNode {
    pub fn new(context_limit: u64, warning_threshold: f64) -> Self {
        Self {
            context_limit,
            warning_threshold,
        }
    }
}

#[async_trait]
impl Node<TurnState> for UsageNode {
    fn id(&self) -> &str {
        NODE_USAGE
    }

    async fn run(&self, mut state: TurnState) -> Result<(TurnState, Next), AgentError> {
        state.usage.context_limit = self.context_limit;
        state.usage.warning_threshold = self.warning_threshold;

        let Some((id, usage)) = state
            .last_assistant()
            .and_then(|a| a.usage.map(|u| (a.id.clone(), u)))
            .filter(|(_, u)| !u.is_empty())
        else {
            debug!("no usage metadata on final answer, skipping accounting");
            return Ok((state, Next::Continue));
        };

        let newly_crossed = match state.usage.record(&id, usage) {
            RecordOutcome::AlreadyCounted => {
                debug!(message_id = %id, "usage already counted");
                return Ok((state, Next::Continue));
            }
            RecordOutcome::Counted { newly_crossed } => newly_crossed,
        };

        let counters = &state.usage;
        let percent = counters.percent();
        let remaining = counters.remaining();
        info!(
            prompt = usage.prompt_tokens,
            completion = usage.completion_tokens,
            cumulative = counters.total_tokens,
            percent = %format_args!("{:.1}", percent),
            remaining,
            "token usage"
        );
        if percent >= counters.warning_threshold {
            warn!(bar = %progress_bar(percent), "context usage above warning threshold");
        } else {
            debug!(bar = %progress_bar(percent), "context usage");
        }

        for level in newly_crossed {
            state
                .messages
                .push(Message::system(usage_warning(level, percent, remaining)));
        }
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AssistantMessage, Usage};
    use crate::state::UsageCounters;

    fn answered(usage: Option<Usage>) -> TurnState {
        let mut s = TurnState::new("sys", UsageCounters::default());
        s.begin_turn("q");
        s.messages
            .push(Message::Assistant(AssistantMessage::new("a", vec![], usage)));
        s
    }

    /// **Scenario**: progress_bar fills proportionally, clamps and labels by band.
    #[test]
    fn progress_bar_bands() {
        let low = progress_bar(25.0);
        assert_eq!(low.matches('█').count(), 10);
        assert!(low.ends_with("25.0% (LOW)"), "{}", low);
        assert!(progress_bar(60.0).ends_with("(MEDIUM)"));
        let over = progress_bar(130.0);
        assert_eq!(over.matches('█').count(), 40);
        assert!(over.ends_with("130.0% (HIGH)"));
        assert_eq!(progress_bar(0.0).matches('-').count(), 40);
    }

    /// **Scenario**: Warning texts per level.
    #[test]
    fn usage_warning_texts() {
        assert_eq!(
            usage_warning(UsageLevel::Moderate, 61.0, 500),
            "Context usage is moderate (61.0%, 500 tokens remaining)."
        );
        assert!(usage_warning(UsageLevel::High, 80.0, 10).starts_with("WARNING:"));
        assert!(usage_warning(UsageLevel::Critical, 99.0, 1).starts_with("CRITICAL:"));
    }

    /// **Scenario**: Usage is added to the totals; limits come from the node.
    #[tokio::test]
    async fn records_usage() {
        let node = UsageNode::new(1000, 80.0);
        let (out, next) = node.run(answered(Some(Usage::new(100, 20)))).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(out.usage.total_tokens, 120);
        assert_eq!(out.usage.context_limit, 1000);
        assert_eq!(out.messages.len(), 3);
    }

    /// **Scenario**: Missing or zero usage is skipped without error.
    #[tokio::test]
    async fn missing_usage_skipped() {
        let node = UsageNode::new(1000, 80.0);
        let (out, _) = node.run(answered(None)).await.unwrap();
        assert_eq!(out.usage.total_tokens, 0);
        let (out, _) = node.run(answered(Some(Usage::default()))).await.unwrap();
        assert_eq!(out.usage.total_tokens, 0);
        assert!(out.usage.last_accounted.is_none());
    }

    /// **Scenario**: Running twice on the same answer counts it once.
    #[tokio::test]
    async fn idempotent_per_answer() {
        let node = UsageNode::new(1000, 80.0);
        let (once, _) = node.run(answered(Some(Usage::new(400, 300)))).await.unwrap();
        let (twice, _) = node.run(once.clone()).await.unwrap();
        assert_eq!(twice, once);
    }

    /// **Scenario**: Crossing 60% appends one moderate warning as a system message.
    #[tokio::test]
    async fn crossing_threshold_appends_warning() {
        let node = UsageNode::new(1000, 80.0);
        let (out, _) = node.run(answered(Some(Usage::new(500, 150)))).await.unwrap();
        match out.messages.last() {
            Some(Message::System(text)) => {
                assert_eq!(text, "Context usage is moderate (65.0%, 350 tokens remaining).")
            }
            other => panic!("expected warning, got {:?}", other),
        }
        assert_eq!(out.usage.highest_warned, Some(UsageLevel::Moderate));
    }

    /// **Scenario**: Jumping from 0% to 85% appends the moderate and the high warning, in
    /// that order.
    #[tokio::test]
    async fn jump_appends_each_crossed_warning() {
        let node = UsageNode::new(1000, 80.0);
        let (out, _) = node.run(answered(Some(Usage::new(800, 50)))).await.unwrap();
        let notes: Vec<&str> = out
            .messages
            .iter()
            .skip(1)
            .filter_map(|m| match m {
                Message::System(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            notes,
            vec![
                "Context usage is moderate (85.0%, 150 tokens remaining).",
                "WARNING: Context usage is high (85.0%, 150 tokens remaining).",
            ]
        );
        assert_eq!(out.usage.highest_warned, Some(UsageLevel::High));
    }
}
