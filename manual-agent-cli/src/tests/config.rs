//! Unit tests for [`RunConfig`](crate::config::RunConfig) and
//! [`RunOptions`](crate::config::RunOptions).
//!
//! Scenarios: defaults, env overrides, invalid numbers, CLI overrides. Most tests use
//! `from_lookup` with a map; the one test that touches the process environment holds a lock.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::{RunConfig, RunOptions};

static ENV_LOCK: std::sync::OnceLock<Mutex<()>> = std::sync::OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

fn from_map(vars: &[(&str, &str)]) -> Result<RunConfig, crate::config::Error> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RunConfig::from_lookup(|name| map.get(name).cloned())
}

/// **Scenario**: With no variables set, every field takes its default.
///
/// Given: an empty variable source  
/// When: from_lookup is called  
/// Then: Ollama on localhost:11434 with llama3.2, 128k budget, thread "1", no manual
#[test]
fn defaults_when_nothing_set() {
    let config = from_map(&[]).unwrap();
    assert_eq!(config, RunConfig::default());
    assert_eq!(config.ollama_host, "localhost");
    assert_eq!(config.ollama_port, 11434);
    assert_eq!(config.model, "llama3.2");
    assert_eq!(config.embedding_model, "nomic-embed-text");
    assert_eq!(config.context_limit, 128_000);
    assert_eq!(config.warning_threshold, 80.0);
    assert_eq!(config.max_tool_rounds, 5);
    assert_eq!(config.thread_id, "1");
    assert_eq!(config.domain, "2018 Ford F-150");
    assert!(config.manual_path.is_none());
    assert!(config.db_path.is_none());
    assert!(!config.approve_tools);
    assert!(!config.verbose);
}

/// **Scenario**: Variables override defaults; flags accept "true" in any case.
#[test]
fn variables_override_defaults() {
    let config = from_map(&[
        ("OLLAMA_HOST", "192.168.1.20"),
        ("OLLAMA_PORT", "11500"),
        ("OLLAMA_MODEL", "qwen2.5"),
        ("LLM_TEMPERATURE", "0.3"),
        ("MANUAL_PATH", "manual.txt"),
        ("BRAVE_API_KEY", "brave-key"),
        ("CONTEXT_LIMIT", "8192"),
        ("TOKEN_WARNING_THRESHOLD", "70"),
        ("MAX_TOOL_ROUNDS", "3"),
        ("TOOL_APPROVAL_ENABLED", "TRUE"),
        ("DB_PATH", "sessions.db"),
        ("THREAD_ID", "garage"),
        ("DOMAIN_NAME", "2019 Ram 1500"),
        ("TELEMETRY", "false"),
    ])
    .unwrap();
    assert_eq!(config.ollama_host, "192.168.1.20");
    assert_eq!(config.ollama_port, 11500);
    assert_eq!(config.model, "qwen2.5");
    assert_eq!(config.temperature, 0.3);
    assert_eq!(config.manual_path.as_deref(), Some("manual.txt"));
    assert_eq!(config.brave_api_key.as_deref(), Some("brave-key"));
    assert_eq!(config.context_limit, 8192);
    assert_eq!(config.warning_threshold, 70.0);
    assert_eq!(config.max_tool_rounds, 3);
    assert!(config.approve_tools);
    assert_eq!(config.db_path.as_deref(), Some("sessions.db"));
    assert_eq!(config.thread_id, "garage");
    assert_eq!(config.domain, "2019 Ram 1500");
    assert!(!config.verbose);
}

/// **Scenario**: A number that does not parse is an error naming the variable.
#[test]
fn invalid_number_is_error() {
    let err = from_map(&[("CONTEXT_LIMIT", "lots")]).unwrap_err();
    assert!(err.to_string().contains("CONTEXT_LIMIT"), "{}", err);
}

/// **Scenario**: Empty values count as unset.
#[test]
fn empty_values_are_unset() {
    let config = from_map(&[("BRAVE_API_KEY", ""), ("OLLAMA_PORT", " ")]).unwrap();
    assert!(config.brave_api_key.is_none());
    assert_eq!(config.ollama_port, 11434);
}

/// **Scenario**: CLI options override env config; unset options leave it alone.
///
/// Given: config with a thread and db path from env  
/// When: options set manual, context limit, approval and verbose  
/// Then: those fields change, thread and db path stay
#[test]
fn apply_options_overrides_only_set_fields() {
    let mut config = from_map(&[("THREAD_ID", "t1"), ("DB_PATH", "a.db")]).unwrap();
    config.apply_options(&RunOptions {
        manual_path: Some("f150.txt".into()),
        context_limit: Some(4096),
        approve_tools: true,
        verbose: true,
        ..Default::default()
    });
    assert_eq!(config.thread_id, "t1");
    assert_eq!(config.db_path.as_deref(), Some("a.db"));
    assert_eq!(config.manual_path.as_deref(), Some("f150.txt"));
    assert_eq!(config.context_limit, 4096);
    assert!(config.approve_tools);
    assert!(config.verbose);

    let options = config.to_turn_options();
    assert_eq!(options.context_limit, 4096);
    assert!(options.verbose);
    assert_eq!(config.runnable_config().thread_id.as_deref(), Some("t1"));
}

/// **Scenario**: from_env reads the process environment.
#[test]
fn from_env_reads_process_environment() {
    let _guard = env_lock();
    let saved = std::env::var("THREAD_ID").ok();
    std::env::set_var("THREAD_ID", "from-env");

    let result = RunConfig::from_env();

    match saved {
        Some(v) => std::env::set_var("THREAD_ID", v),
        None => std::env::remove_var("THREAD_ID"),
    }
    assert_eq!(result.unwrap().thread_id, "from-env");
}
