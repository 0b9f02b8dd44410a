//! Scenario 1: Echo
//!
//! A single "Assistant" agent with one `echo` tool. Two turns run on the
//! same runner, so the second decision sees the first turn's conversation.

use std::sync::Arc;

use serde_json::{json, Value};

use agentic_audit::InMemoryEventLog;
use agentic_contracts::error::AgenticResult;
use agentic_core::{Agent, AgentRegistry, Engine, FunctionTool, InMemoryStore};

use crate::models::echo_model;

use super::{drive_turn, print_summary, Desk, ScriptedAnswers};

pub fn echo_tool() -> FunctionTool {
    FunctionTool::from_fn(
        "echo",
        "Return the text argument unchanged.",
        json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        }),
        |args, _ctx| Ok(args.get("text").cloned().unwrap_or(Value::Null)),
    )
}

pub fn setup() -> AgenticResult<Desk> {
    let registry = AgentRegistry::new();
    let root = registry.register(
        Agent::new("Assistant")
            .instructions("Repeat what the user says using the echo tool.")
            .model("echo")
            .tool(echo_tool()),
    )?;

    let log = Arc::new(InMemoryEventLog::new("scenario-echo"));
    let memory = Arc::new(InMemoryStore::new());
    let engine = Engine::builder()
        .agents(registry)
        .memory(memory.clone())
        .model("echo", Arc::new(echo_model()))
        .sink(log.clone())
        .build();

    Ok(Desk {
        engine,
        root,
        log,
        memory,
    })
}

/// Run Scenario 1: Echo.
pub fn run_scenario() -> AgenticResult<()> {
    println!("=== Scenario 1: Echo ===");
    println!();

    let desk = setup()?;
    let mut runner = desk.runner()?;
    let mut no_answers = ScriptedAnswers::default();

    for input in ["hello", "hello again"] {
        println!("  Turn: \"{}\"", input);
        let report = drive_turn(&mut runner, input, &mut no_answers)?;
        print_summary(&report, &desk.log);
        println!(
            "  Conversation so far: {} events",
            runner.conversation().len()
        );
        println!();
    }

    runner.close()?;
    Ok(())
}
