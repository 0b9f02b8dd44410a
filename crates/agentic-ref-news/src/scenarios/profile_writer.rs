//! Scenario 3: Profile Writer
//!
//! A "Profile Researcher" finds a person in the directory and stores the
//! full profile as a memory block. Only the block id travels to the
//! "Profile Writer" sub-agent, which reads the block with
//! `read_memory_block` and condenses it. Closing the run releases the block.

use std::sync::Arc;

use agentic_audit::InMemoryEventLog;
use agentic_contracts::error::AgenticResult;
use agentic_core::{memory::read_block_tool, Agent, AgentRegistry, Engine, InMemoryStore};

use crate::{
    mock_data::{fetch_profile_tool, search_profiles_tool},
    models::{researcher_model, writer_model},
};

use super::{drive_turn, print_summary, Desk, ScriptedAnswers};

pub fn setup() -> AgenticResult<Desk> {
    let registry = AgentRegistry::new();

    let writer = registry.register(
        Agent::new("Profile Writer")
            .instructions("Write a two-sentence profile from the memory block you are given.")
            .model("writer")
            .tool(read_block_tool()),
    )?;
    let researcher = registry.register(
        Agent::new("Profile Researcher")
            .instructions(
                "Find the person in the directory, store their profile and ask the \
                 writer for a short profile.",
            )
            .model("researcher")
            .tool(search_profiles_tool())
            .tool(fetch_profile_tool()),
    )?;
    registry.add_child(&researcher, &writer)?;

    let log = Arc::new(InMemoryEventLog::new("scenario-profile"));
    let memory = Arc::new(InMemoryStore::new());
    let engine = Engine::builder()
        .agents(registry)
        .memory(memory.clone())
        .model("researcher", Arc::new(researcher_model()))
        .model("writer", Arc::new(writer_model()))
        .sink(log.clone())
        .build();

    Ok(Desk {
        engine,
        root: researcher,
        log,
        memory,
    })
}

/// Research and write a profile of `name`.
pub fn run_profile(name: &str) -> AgenticResult<()> {
    let desk = setup()?;
    let mut runner = desk.runner()?;

    println!("  Subject: {}", name);
    let report = drive_turn(&mut runner, name, &mut ScriptedAnswers::default())?;
    print_summary(&report, &desk.log);

    let blocks = desk.memory.len();
    let released = runner.close()?;
    println!(
        "  Memory blocks: {} stored during the run, {} released on close",
        blocks, released
    );
    Ok(())
}

/// Run Scenario 3: Profile Writer.
pub fn run_scenario() -> AgenticResult<()> {
    println!("=== Scenario 3: Profile Writer ===");
    println!();

    run_profile("Mara Quill")?;
    println!();
    Ok(())
}
