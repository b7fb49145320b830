//! manual-agent-cli library: config, terminal approval and run helpers for the binary.
//!
//! Reads config from env / .env and CLI flags, builds the turn runner with Ollama, the manual
//! index, Brave search and the session store, then runs one turn per user message.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let mut config = manual_agent_cli::RunConfig::from_env()?;
//! config.apply_options(&options);
//! let runner = manual_agent_cli::build_runner(&config).await?;
//! let reply = manual_agent_cli::run_turn(&runner, "what is fuse 33 for?").await?;
//! ```

mod approver;
mod config;
mod logging;
mod run;

pub use approver::{format_approval_prompt, parse_answer, StdinApprover};
pub use config::{Error, RunConfig, RunOptions};
pub use logging::init_tracing;
pub use manual_agent::{Message, TurnState};
#[cfg(feature = "openai")]
pub use run::build_runner;
pub use run::{build_runner_with, run_turn, session_summary};

pub use approver::read_stdin_line;

#[cfg(test)]
mod tests;
