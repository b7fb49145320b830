//! Pre-filter node: answers pure pleasantries without calling the model.
//!
//! Classification is an anchored, case-insensitive pattern match on the latest user
//! message. False negatives are fine: anything unrecognised goes on to reasoning.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::RegexSet;
use tracing::debug;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::TurnState;

use super::NODE_PREFILTER;

/// Kind of conversational message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pleasantry {
    Greeting,
    Thanks,
    Acknowledgment,
    Farewell,
    Affirmation,
    Negation,
}

impl Pleasantry {
    /// Canned reply for this category.
    pub fn reply(&self, domain: &str) -> String {
        match self {
            Pleasantry::Greeting => format!("Hello! How can I help you with your {} today?", domain),
            Pleasantry::Thanks => format!(
                "You're welcome! Let me know if you have any other questions about your {}!",
                domain
            ),
            Pleasantry::Acknowledgment => format!(
                "Glad I could help! Feel free to ask anything else about your {}.",
                domain
            ),
            Pleasantry::Farewell => format!("Goodbye! Come back anytime you have {} questions!", domain),
            Pleasantry::Affirmation => format!(
                "Got it! Anything else you'd like to know about your {}?",
                domain
            ),
            Pleasantry::Negation => format!(
                "No problem! Let me know if you need anything else about your {}.",
                domain
            ),
        }
    }
}

/// Result of classifying one user message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Conversational(Pleasantry),
    Substantive,
    /// No usable text (missing or blank). Treated like `Substantive`.
    Ambiguous,
}

const PATTERNS: &[(Pleasantry, &str)] = &[
    (
        Pleasantry::Greeting,
        r"^(hi|hello|hey|sup|yo|howdy|good (morning|afternoon|evening))( there)?[\s!.]*$",
    ),
    (
        Pleasantry::Thanks,
        r"^(thank you|thanks|thx|ty|thank u|tysm|appreciate it)( so much| very much| a lot)?[\s!.]*$",
    ),
    (
        Pleasantry::Thanks,
        r"^(great|ok|okay|cool|nice|perfect|awesome)[\s,!.]*(thank you|thanks|thx)[\s!.]*$",
    ),
    (
        Pleasantry::Acknowledgment,
        r"^(great|ok|okay|got it|cool|nice|perfect|awesome|excellent)[\s!.]*$",
    ),
    (
        Pleasantry::Farewell,
        r"^(bye|goodbye|see you|later|cya|take care)[\s!.]*$",
    ),
    (
        Pleasantry::Affirmation,
        r"^(yes|yeah|yep|yup|sure|alright)[\s!.]*$",
    ),
    (Pleasantry::Negation, r"^(no|nope|nah)[\s!.]*$"),
];

fn patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new(PATTERNS.iter().map(|(_, p)| format!("(?i){}", p)))
            .expect("pleasantry patterns are valid")
    })
}

/// Classifies the latest user message.
pub fn classify(text: Option<&str>) -> Classification {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Classification::Ambiguous,
    };
    match patterns().matches(text).iter().next() {
        Some(i) => Classification::Conversational(PATTERNS[i].0),
        None => Classification::Substantive,
    }
}

/// Pre-filter node.
///
/// On a pleasantry appends the canned reply and sets `bypassed`, so the outgoing edge
/// routes straight to END. Otherwise leaves the state untouched.
pub struct PreFilterNode {
    domain: String,
}

impl PreFilterNode {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

#[async_trait]
impl Node<TurnState> for PreFilterNode {
    fn id(&self) -> &str {
        NODE_PREFILTER
    }

    async fn run(&self, mut state: TurnState) -> Result<(TurnState, Next), AgentError> {
        let classification = classify(state.last_user_text());
        debug!(?classification, "pre-filter");
        if let Classification::Conversational(kind) = classification {
            state.messages.push(Message::assistant(kind.reply(&self.domain)));
            state.bypassed = true;
        }
        Ok((state, Next::Continue))
    }
}
