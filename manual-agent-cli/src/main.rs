//! Owner's-manual assistant binary: one-shot with `-m`, otherwise an interactive session.

use std::io::Write;

use clap::Parser;
use manual_agent_cli::{
    build_runner, init_tracing, run_turn, session_summary, Error, RunConfig, RunOptions,
};

#[derive(Parser, Debug)]
#[command(name = "manual-agent")]
#[command(about = "Ask questions about your vehicle's owner's manual")]
struct Args {
    /// Ask one question and exit.
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Session id; the conversation continues across runs with the same id and --db-path.
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,

    /// Plain-text export of the owner's manual (pages separated by form feeds).
    #[arg(long, value_name = "PATH")]
    manual: Option<String>,

    /// SQLite file for sessions (in memory when omitted).
    #[arg(long, value_name = "PATH")]
    db_path: Option<String>,

    /// Ask before running tool calls.
    #[arg(long)]
    approve_tools: bool,

    /// Log node enter/exit and token usage to stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Context budget in tokens.
    #[arg(long, value_name = "TOKENS")]
    context_limit: Option<u64>,
}

impl Args {
    fn to_run_options(&self) -> RunOptions {
        RunOptions {
            thread_id: self.thread_id.clone(),
            manual_path: self.manual.clone(),
            db_path: self.db_path.clone(),
            approve_tools: self.approve_tools,
            verbose: self.verbose,
            context_limit: self.context_limit,
        }
    }
}

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

fn print_welcome(config: &RunConfig) {
    let rule = "=".repeat(70);
    println!("{}", rule);
    println!("{} Expert Assistant", config.domain);
    println!("{}", rule);
    println!("Ask me anything about your {}!", config.domain);
    if config.approve_tools {
        println!("   [You will be asked to approve tool calls]");
    }
    println!("\nType 'quit' to exit");
    println!("{}", rule);
}

async fn interactive(runner: &manual_agent::TurnRunner, config: &RunConfig) -> Result<(), Error> {
    print_welcome(config);
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;
        let Some(line) = manual_agent_cli::read_stdin_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&input.to_lowercase().as_str()) {
            break;
        }
        match run_turn(runner, input).await {
            Ok(reply) => println!("\nAssistant: {}", reply),
            Err(e) => eprintln!("error: {}", e),
        }
    }
    if let Some(state) = runner.load_session().await? {
        println!("{}", session_summary(&state));
    }
    println!("\nGoodbye!");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = RunConfig::from_env()?;
    config.apply_options(&args.to_run_options());
    init_tracing(config.verbose);

    let runner = build_runner(&config).await?;

    match &args.message {
        Some(message) => match run_turn(&runner, message).await {
            Ok(reply) => println!("Assistant: {}", reply),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        },
        None => interactive(&runner, &config).await?,
    }
    Ok(())
}
