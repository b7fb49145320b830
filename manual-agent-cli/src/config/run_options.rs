//! Optional overrides for a run (CLI args or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options). Callers (the binary
//! or tests) build a `RunOptions` and pass it to get env-based config with overrides applied.

/// Optional overrides: session, manual, persistence, approval gate, logging.
///
/// Only set fields override the base config (from env); `approve_tools` and `verbose` can
/// only switch their feature on.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Session id for the checkpointer.
    pub thread_id: Option<String>,
    /// Plain-text manual export to index for `search_manual`.
    pub manual_path: Option<String>,
    /// SQLite database path for persistence.
    pub db_path: Option<String>,
    /// Ask before running tool calls.
    pub approve_tools: bool,
    /// Node enter/exit logging and info-level logs.
    pub verbose: bool,
    /// Context budget in tokens.
    pub context_limit: Option<u64>,
}
