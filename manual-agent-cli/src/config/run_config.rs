//! Run config: inference endpoint, models, manual, search key, budget and session.
//! Filled from env / .env, then overridden by [`RunOptions`](super::RunOptions).
//!
//! Interacts with [`build_runner`](crate::build_runner) and manual-agent's `TurnOptions`.

use std::str::FromStr;

use manual_agent::router::{DEFAULT_DOMAIN, DEFAULT_MAX_TOOL_ROUNDS};
use manual_agent::state::{DEFAULT_CONTEXT_LIMIT, DEFAULT_WARNING_THRESHOLD};
use manual_agent::{RunnableConfig, TurnOptions};

use super::RunOptions;

/// Error type used for config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Run config for the assistant binary.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Ollama host, e.g. `localhost`.
    pub ollama_host: String,
    pub ollama_port: u16,
    /// Chat model name, e.g. `llama3.2`.
    pub model: String,
    /// Sampling temperature; 0 keeps answers deterministic.
    pub temperature: f32,
    /// Embedding model for the manual index, e.g. `nomic-embed-text`.
    pub embedding_model: String,
    /// Plain-text manual export. Without it `search_manual` reports the manual is not loaded.
    pub manual_path: Option<String>,
    /// Brave Search key. Without it `search_web` reports it is not configured.
    pub brave_api_key: Option<String>,
    pub context_limit: u64,
    /// Percent of the context at which usage is logged at warn level.
    pub warning_threshold: f64,
    pub max_tool_rounds: u32,
    /// Ask on stdin before running tool calls.
    pub approve_tools: bool,
    /// SQLite database for sessions; in-memory when unset.
    pub db_path: Option<String>,
    pub thread_id: String,
    /// Product named in the persona and canned replies.
    pub domain: String,
    /// Node enter/exit logging.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ollama_host: "localhost".to_string(),
            ollama_port: 11434,
            model: "llama3.2".to_string(),
            temperature: 0.0,
            embedding_model: "nomic-embed-text".to_string(),
            manual_path: None,
            brave_api_key: None,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            approve_tools: false,
            db_path: None,
            thread_id: "1".to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            verbose: false,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, Error> {
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has an invalid value: {:?}", name, v),
            )) as Error
        }),
    }
}

fn parse_flag(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl RunConfig {
    /// Fill config from env vars (and .env). Call `dotenv::dotenv().ok()` first.
    ///
    /// All variables are optional: `OLLAMA_HOST`, `OLLAMA_PORT`, `OLLAMA_MODEL`,
    /// `LLM_TEMPERATURE`, `EMBEDDING_MODEL`, `MANUAL_PATH`, `BRAVE_API_KEY`, `CONTEXT_LIMIT`,
    /// `TOKEN_WARNING_THRESHOLD`, `MAX_TOOL_ROUNDS`, `TOOL_APPROVAL_ENABLED`, `DB_PATH`,
    /// `THREAD_ID`, `DOMAIN_NAME`, `TELEMETRY`. Numeric values that do not parse are errors.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(Self {
            ollama_host: non_empty("OLLAMA_HOST").unwrap_or(d.ollama_host),
            ollama_port: parse_var("OLLAMA_PORT", non_empty("OLLAMA_PORT"), d.ollama_port)?,
            model: non_empty("OLLAMA_MODEL").unwrap_or(d.model),
            temperature: parse_var("LLM_TEMPERATURE", non_empty("LLM_TEMPERATURE"), d.temperature)?,
            embedding_model: non_empty("EMBEDDING_MODEL").unwrap_or(d.embedding_model),
            manual_path: non_empty("MANUAL_PATH"),
            brave_api_key: non_empty("BRAVE_API_KEY"),
            context_limit: parse_var("CONTEXT_LIMIT", non_empty("CONTEXT_LIMIT"), d.context_limit)?,
            warning_threshold: parse_var(
                "TOKEN_WARNING_THRESHOLD",
                non_empty("TOKEN_WARNING_THRESHOLD"),
                d.warning_threshold,
            )?,
            max_tool_rounds: parse_var(
                "MAX_TOOL_ROUNDS",
                non_empty("MAX_TOOL_ROUNDS"),
                d.max_tool_rounds,
            )?,
            approve_tools: parse_flag(lookup("TOOL_APPROVAL_ENABLED")),
            db_path: non_empty("DB_PATH"),
            thread_id: non_empty("THREAD_ID").unwrap_or(d.thread_id),
            domain: non_empty("DOMAIN_NAME").unwrap_or(d.domain),
            verbose: parse_flag(lookup("TELEMETRY")),
        })
    }

    /// Apply optional overrides from `RunOptions` to this config.
    pub fn apply_options(&mut self, options: &RunOptions) {
        if let Some(t) = &options.thread_id {
            self.thread_id = t.clone();
        }
        if options.manual_path.is_some() {
            self.manual_path = options.manual_path.clone();
        }
        if options.db_path.is_some() {
            self.db_path = options.db_path.clone();
        }
        if let Some(limit) = options.context_limit {
            self.context_limit = limit;
        }
        if options.approve_tools {
            self.approve_tools = true;
        }
        if options.verbose {
            self.verbose = true;
        }
    }

    /// Router settings for manual-agent's `TurnRunner`.
    pub fn to_turn_options(&self) -> TurnOptions {
        TurnOptions {
            domain: self.domain.clone(),
            max_tool_rounds: self.max_tool_rounds,
            context_limit: self.context_limit,
            warning_threshold: self.warning_threshold,
            verbose: self.verbose,
            ..Default::default()
        }
    }

    pub fn runnable_config(&self) -> RunnableConfig {
        RunnableConfig::for_thread(self.thread_id.clone())
    }
}
