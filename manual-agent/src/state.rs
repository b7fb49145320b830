//! Turn router state: message history, cumulative usage counters, per-turn flags.
//!
//! `TurnState` is the single state type flowing through the router graph and the value
//! persisted by the checkpointer for a session.

use serde::{Deserialize, Serialize};

use crate::message::{AssistantMessage, Message, Usage};

/// Default context window (tokens) for the session budget.
pub const DEFAULT_CONTEXT_LIMIT: u64 = 128_000;

/// Default percent at which accounting starts logging at warn level.
pub const DEFAULT_WARNING_THRESHOLD: f64 = 80.0;

/// One tool invocation requested by the reasoning stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// JSON-encoded arguments as produced by the model.
    pub arguments: String,
    pub id: Option<String>,
}

impl ToolCall {
    /// Provider id of the call, or `call_{index}` (position in its batch) when the backend
    /// sent none. The request and its result must use the same value.
    pub fn call_id(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("call_{}", index))
    }
}

/// Severity of a context-usage warning. Ordered by threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UsageLevel {
    /// 60% of the context limit.
    Moderate,
    /// 80% of the context limit.
    High,
    /// 95% of the context limit.
    Critical,
}

impl UsageLevel {
    pub const ALL: [UsageLevel; 3] = [UsageLevel::Moderate, UsageLevel::High, UsageLevel::Critical];

    pub fn threshold_percent(&self) -> f64 {
        match self {
            UsageLevel::Moderate => 60.0,
            UsageLevel::High => 80.0,
            UsageLevel::Critical => 95.0,
        }
    }

    /// Highest level whose threshold is at or below `percent`.
    pub fn for_percent(percent: f64) -> Option<UsageLevel> {
        Self::ALL
            .iter()
            .rev()
            .find(|l| percent >= l.threshold_percent())
            .copied()
    }
}

/// Outcome of recording one assistant message's usage.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordOutcome {
    /// The message was already counted; totals unchanged.
    AlreadyCounted,
    /// Totals updated. `newly_crossed` lists every threshold crossed for the first time,
    /// lowest first.
    Counted { newly_crossed: Vec<UsageLevel> },
}

/// Cumulative token totals for a session plus the budget they are measured against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub context_limit: u64,
    /// Percent above which accounting logs at warn level.
    pub warning_threshold: f64,
    /// Highest warning level already appended this session.
    #[serde(default)]
    pub highest_warned: Option<UsageLevel>,
    /// Id of the last assistant message counted.
    #[serde(default)]
    pub last_accounted: Option<String>,
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LIMIT, DEFAULT_WARNING_THRESHOLD)
    }
}

impl UsageCounters {
    pub fn new(context_limit: u64, warning_threshold: f64) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            context_limit,
            warning_threshold,
            highest_warned: None,
            last_accounted: None,
        }
    }

    /// Usage as a percentage of the context limit; 0 when the limit is 0.
    pub fn percent(&self) -> f64 {
        if self.context_limit == 0 {
            return 0.0;
        }
        self.total_tokens as f64 / self.context_limit as f64 * 100.0
    }

    pub fn remaining(&self) -> u64 {
        self.context_limit.saturating_sub(self.total_tokens)
    }

    /// Adds `usage` for the message with `message_id`, unless that message was the last
    /// one counted. Crossing several thresholds at once reports each of them.
    pub fn record(&mut self, message_id: &str, usage: Usage) -> RecordOutcome {
        if self.last_accounted.as_deref() == Some(message_id) {
            return RecordOutcome::AlreadyCounted;
        }
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens = self.prompt_tokens + self.completion_tokens;
        self.last_accounted = Some(message_id.to_string());

        let percent = self.percent();
        let newly_crossed: Vec<UsageLevel> = UsageLevel::ALL
            .iter()
            .copied()
            .filter(|l| percent >= l.threshold_percent())
            .filter(|l| self.highest_warned.map_or(true, |w| *l > w))
            .collect();
        if let Some(highest) = newly_crossed.last() {
            self.highest_warned = Some(*highest);
        }
        RecordOutcome::Counted { newly_crossed }
    }
}

/// Graph state for one session.
///
/// `messages` and `usage` persist across turns; `bypassed` and `tool_rounds` are reset at the
/// start of every turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub messages: Vec<Message>,
    pub usage: UsageCounters,
    /// Set by the pre-filter when it answered the turn itself.
    #[serde(default)]
    pub bypassed: bool,
    /// Tool rounds (executed or rejected) spent in the current turn.
    #[serde(default)]
    pub tool_rounds: u32,
}

impl TurnState {
    /// Fresh session state: system prompt, no history.
    pub fn new(system_prompt: impl Into<String>, usage: UsageCounters) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            usage,
            bypassed: false,
            tool_rounds: 0,
        }
    }

    /// Appends the user message and clears per-turn fields.
    pub fn begin_turn(&mut self, user_message: impl Into<String>) {
        self.messages.push(Message::user(user_message));
        self.bypassed = false;
        self.tool_rounds = 0;
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::User(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn last_assistant(&self) -> Option<&AssistantMessage> {
        self.messages.iter().rev().find_map(Message::as_assistant)
    }

    /// Tool calls requested by the newest message, if it is an assistant message.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self.messages.last() {
            Some(Message::Assistant(a)) => &a.tool_calls,
            _ => &[],
        }
    }

    /// Text of the newest assistant message that did not request tools.
    pub fn final_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant(a) if !a.has_tool_calls() => Some(a.content.as_str()),
            _ => None,
        })
    }

    /// Number of user messages in the history.
    pub fn interactions(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| matches!(m, Message::User(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(limit: u64) -> UsageCounters {
        UsageCounters::new(limit, DEFAULT_WARNING_THRESHOLD)
    }

    /// **Scenario**: for_percent picks the highest threshold at or below the value.
    #[test]
    fn usage_level_for_percent() {
        assert_eq!(UsageLevel::for_percent(59.9), None);
        assert_eq!(UsageLevel::for_percent(60.0), Some(UsageLevel::Moderate));
        assert_eq!(UsageLevel::for_percent(85.0), Some(UsageLevel::High));
        assert_eq!(UsageLevel::for_percent(120.0), Some(UsageLevel::Critical));
    }

    /// **Scenario**: Recording the same message twice does not double-count.
    #[test]
    fn record_is_idempotent_per_message() {
        let mut c = counters(1000);
        let first = c.record("m1", Usage::new(100, 20));
        assert_eq!(first, RecordOutcome::Counted { newly_crossed: vec![] });
        assert_eq!(c.record("m1", Usage::new(100, 20)), RecordOutcome::AlreadyCounted);
        assert_eq!(c.total_tokens, 120);
        assert_eq!(c.prompt_tokens, 100);
        assert_eq!(c.completion_tokens, 20);
    }

    /// **Scenario**: Each threshold is reported once, when first crossed.
    #[test]
    fn thresholds_reported_once_each() {
        let mut c = counters(1000);
        let mut crossed = Vec::new();
        for (i, tokens) in [300u64, 310, 100, 50, 150, 50].iter().enumerate() {
            if let RecordOutcome::Counted { newly_crossed } =
                c.record(&format!("m{}", i), Usage::new(*tokens, 0))
            {
                crossed.extend(newly_crossed);
            }
        }
        assert_eq!(
            crossed,
            vec![UsageLevel::Moderate, UsageLevel::High, UsageLevel::Critical]
        );
        assert_eq!(c.total_tokens, 960);
    }

    /// **Scenario**: A jump over several thresholds reports all of them, lowest first, and
    /// none of them again afterwards.
    #[test]
    fn jump_reports_every_crossed_level() {
        let mut c = counters(1000);
        assert_eq!(
            c.record("a", Usage::new(800, 50)),
            RecordOutcome::Counted {
                newly_crossed: vec![UsageLevel::Moderate, UsageLevel::High]
            }
        );
        assert_eq!(c.highest_warned, Some(UsageLevel::High));
        assert_eq!(
            c.record("b", Usage::new(10, 0)),
            RecordOutcome::Counted { newly_crossed: vec![] }
        );
        assert_eq!(
            c.record("c", Usage::new(100, 0)),
            RecordOutcome::Counted {
                newly_crossed: vec![UsageLevel::Critical]
            }
        );
    }

    /// **Scenario**: Zero context limit yields 0% rather than dividing by zero.
    #[test]
    fn zero_limit_percent_is_zero() {
        let mut c = counters(0);
        c.record("a", Usage::new(10, 10));
        assert_eq!(c.percent(), 0.0);
        assert_eq!(c.remaining(), 0);
    }

    /// **Scenario**: begin_turn appends the user message and resets per-turn fields only.
    #[test]
    fn begin_turn_resets_per_turn_fields() {
        let mut s = TurnState::new("sys", UsageCounters::default());
        s.bypassed = true;
        s.tool_rounds = 3;
        s.usage.total_tokens = 42;
        s.begin_turn("hello");
        assert!(!s.bypassed);
        assert_eq!(s.tool_rounds, 0);
        assert_eq!(s.usage.total_tokens, 42);
        assert_eq!(s.last_user_text(), Some("hello"));
        assert_eq!(s.interactions(), 1);
    }

    /// **Scenario**: pending_tool_calls only looks at the newest message.
    #[test]
    fn pending_tool_calls_from_last_message() {
        let mut s = TurnState::new("sys", UsageCounters::default());
        s.messages.push(Message::Assistant(AssistantMessage::new(
            "",
            vec![ToolCall {
                name: "search_manual".into(),
                arguments: "{}".into(),
                id: None,
            }],
            None,
        )));
        assert_eq!(s.pending_tool_calls().len(), 1);
        assert_eq!(s.final_reply(), None);
        s.messages.push(Message::assistant("done"));
        assert!(s.pending_tool_calls().is_empty());
        assert_eq!(s.final_reply(), Some("done"));
    }

    /// **Scenario**: call_id prefers the provider id and falls back to the batch position.
    #[test]
    fn call_id_fallback() {
        let mut call = ToolCall {
            name: "search_web".into(),
            arguments: "{}".into(),
            id: Some("abc".into()),
        };
        assert_eq!(call.call_id(3), "abc");
        call.id = None;
        assert_eq!(call.call_id(3), "call_3");
    }
}
