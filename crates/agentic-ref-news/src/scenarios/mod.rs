//! Reference scenarios, plus the small driver they share.
//!
//! Every scenario builds an `Engine` with an `InMemoryEventLog` attached,
//! drives one or more turns while printing the visible event stream, and
//! finishes by checking the log's hash chain.

pub mod config_tree;
pub mod echo;
pub mod news_producer;
pub mod profile_writer;

use std::{collections::VecDeque, sync::Arc};

use tracing::debug;

use agentic_audit::InMemoryEventLog;
use agentic_contracts::{
    error::AgenticResult, event::Event, ids::AgentId, model::TurnUsage, state::TurnState,
};
use agentic_core::{AgentRunner, Engine, InMemoryStore, InterruptTool};

// ── Human input ───────────────────────────────────────────────────────────────

/// Source of answers to interrupt prompts.
pub trait HumanInput {
    /// Answer `prompt`, or return `None` to cancel the turn.
    fn answer(&mut self, prompt: &str) -> Option<String>;
}

/// Answers taken from a fixed list, in order. Runs out by cancelling.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    answers: VecDeque<String>,
}

impl ScriptedAnswers {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl HumanInput for ScriptedAnswers {
    fn answer(&mut self, _prompt: &str) -> Option<String> {
        self.answers.pop_front()
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// An engine wired for a scenario, with the agent the caller talks to.
pub struct Desk {
    pub engine: Arc<Engine>,
    pub root: AgentId,
    pub log: Arc<InMemoryEventLog>,
    pub memory: Arc<InMemoryStore>,
}

impl Desk {
    pub fn runner(&self) -> AgenticResult<AgentRunner> {
        self.engine.runner(&self.root)
    }
}

/// What one driven turn produced.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Every event the caller saw, in order.
    pub events: Vec<Event>,
    pub state: TurnState,
    pub final_output: Option<String>,
    /// How many interrupts the caller was asked to answer.
    pub interrupts: usize,
    /// Model usage of the top-level agent's decisions.
    pub usage: TurnUsage,
}

/// Start a turn with `input` and pull it to the end, answering every
/// interrupt from `human` and printing each visible event.
///
/// When `human` has no answer the turn is cancelled.
pub fn drive_turn(
    runner: &mut AgentRunner,
    input: &str,
    human: &mut dyn HumanInput,
) -> AgenticResult<TurnReport> {
    runner.start(input)?;

    let mut events = Vec::new();
    let mut interrupts = 0;
    loop {
        for event in runner.by_ref() {
            println!("    {}", event);
            events.push(event);
        }
        if runner.state() != TurnState::AwaitingInput {
            break;
        }

        let prompt = runner
            .pending_interrupt()
            .and_then(Event::prompt)
            .unwrap_or(InterruptTool::DEFAULT_PROMPT)
            .to_string();
        interrupts += 1;
        match human.answer(&prompt) {
            Some(answer) => {
                println!("    > {}", answer);
                runner.continue_with(&answer)?;
            }
            None => {
                debug!(agent_id = %runner.agent_id(), "no answer, cancelling turn");
                println!("    > (no answer)");
                runner.cancel();
            }
        }
    }

    Ok(TurnReport {
        events,
        state: runner.state(),
        final_output: runner.final_output().map(str::to_string),
        interrupts,
        usage: *runner.usage(),
    })
}

/// Print the outcome line and the log integrity line shared by every
/// scenario.
pub fn print_summary(report: &TurnReport, log: &InMemoryEventLog) {
    match (&report.final_output, report.state) {
        (Some(output), TurnState::Finished) => println!("  Result: {}", output),
        (_, state) => println!("  Result: turn ended as {}", state),
    }
    println!(
        "  Model usage: {} completions, ~{} input / ~{} output tokens",
        report.usage.completions, report.usage.input_tokens, report.usage.output_tokens
    );

    let sealed = log.sealed_turns().len();
    if log.verify_integrity() {
        println!(
            "  Event log integrity: VERIFIED ({} entries, {} turns sealed)",
            log.len(),
            sealed
        );
    } else {
        println!(
            "  Event log integrity: BROKEN at entry {}",
            log.first_break().unwrap_or_default()
        );
    }
}
