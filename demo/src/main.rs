//! Agentic Turn Scheduler: News-Desk Demo CLI
//!
//! Runs one or all of the reference scenarios. Each scenario wires the real
//! scheduler (registry, runner, sub-agents, memory blocks, hash-chained event
//! log) to deterministic models and mock newsroom data.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- echo
//!   cargo run -p demo -- news --interactive
//!   cargo run -p demo -- news --answer knitting --answer climate
//!   cargo run -p demo -- profile --name "Tomas Reyle"
//!   cargo run -p demo -- config agents/news.toml --interactive

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use agentic_contracts::error::AgenticResult;
use agentic_ref_news::scenarios::{
    config_tree, echo, news_producer, profile_writer, HumanInput, ScriptedAnswers,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Agentic turn scheduler news-desk demo.
///
/// Each subcommand runs one or all of the reference scenarios, printing the
/// event stream the caller sees and the integrity of the event log.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Agentic turn scheduler news-desk demo",
    long_about = "Runs news-desk scenarios showing nested agents, human-input interrupts,\n\
                  memory blocks, checkpoints and event log integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Where interrupt answers come from.
#[derive(Args)]
struct AnswerArgs {
    /// Answer prompts from stdin instead of the scripted answers.
    #[arg(long)]
    interactive: bool,

    /// Scripted answer, used in order. Repeat for several prompts.
    #[arg(long = "answer", value_name = "TEXT")]
    answers: Vec<String>,
}

impl AnswerArgs {
    fn human(&self, default: &[&str]) -> Box<dyn HumanInput> {
        if self.interactive {
            Box::new(StdinAnswers)
        } else if self.answers.is_empty() {
            Box::new(ScriptedAnswers::new(default.iter().copied()))
        } else {
            Box::new(ScriptedAnswers::new(self.answers.clone()))
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: a single agent with an echo tool, two turns.
    Echo,
    /// Scenario 2: producer, reporter sub-agent and human-input interrupts.
    News {
        #[command(flatten)]
        answers: AnswerArgs,
    },
    /// Scenario 3: a profile passed between agents as a memory block.
    Profile {
        /// Person to look up in the mock directory.
        #[arg(long, default_value = "Mara Quill")]
        name: String,
    },
    /// Load an agent tree from a TOML file and drive one turn of its root.
    Config {
        /// Path to the agent tree file.
        path: PathBuf,

        /// Input that opens the turn.
        #[arg(long, default_value = news_producer::OPENING_INPUT)]
        input: String,

        #[command(flatten)]
        answers: AnswerArgs,
    },
}

// ── Interactive answers ───────────────────────────────────────────────────────

/// Answers read line by line from stdin. End of input cancels the turn.
struct StdinAnswers;

impl HumanInput for StdinAnswers {
    fn answer(&mut self, prompt: &str) -> Option<String> {
        print!("  {} ", prompt);
        io::stdout().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                debug!("stdin closed while a prompt was pending");
                None
            }
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging. Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Echo => echo::run_scenario(),
        Command::News { answers } => run_news(&answers),
        Command::Profile { name } => run_profile(&name),
        Command::Config {
            path,
            input,
            answers,
        } => run_config(&path, &input, &answers),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> AgenticResult<()> {
    echo::run_scenario()?;
    news_producer::run_scenario()?;
    profile_writer::run_scenario()?;
    config_tree::run_scenario()?;
    Ok(())
}

fn run_news(answers: &AnswerArgs) -> AgenticResult<()> {
    if !answers.interactive && answers.answers.is_empty() {
        return news_producer::run_scenario();
    }
    println!("=== Scenario 2: News Producer ===");
    println!();
    news_producer::run_desk(answers.human(&[]).as_mut())
}

fn run_profile(name: &str) -> AgenticResult<()> {
    println!("=== Scenario 3: Profile Writer ===");
    println!();
    profile_writer::run_profile(name)
}

fn run_config(path: &Path, input: &str, answers: &AnswerArgs) -> AgenticResult<()> {
    println!("=== Agent tree: {} ===", path.display());
    println!();
    config_tree::run_file(path, input, answers.human(&["AI"]).as_mut())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Agentic Turn Scheduler");
    println!("News-Desk Reference Demo");
    println!("======================");
    println!();
    println!("Per decision step:");
    println!("  [1] Snapshot the agent's tools and instructions from the registry");
    println!("  [2] Ask the model: final text, or a batch of tool calls");
    println!("  [3] Dispatch the batch; a sub-agent call runs a nested turn one level down");
    println!("  [4] An interrupt anywhere in the tree parks the top-level turn until answered");
    println!("  [5] Every event lands in a SHA-256 chained log; each finished turn is sealed");
    println!();
}
