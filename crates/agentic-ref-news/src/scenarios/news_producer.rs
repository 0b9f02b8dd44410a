//! Scenario 2: News Producer
//!
//! A "Producer" agent asks the human for a topic, delegates to a
//! "News Reporter" sub-agent and prints a one-sentence summary.
//!
//! Sub-case A: the wire has headlines for the topic; one interrupt at depth 0.
//! Sub-case B: the wire has nothing, so the reporter asks the editor for
//!             another topic; its interrupt surfaces from depth 1 and the
//!             answer resumes the reporter in place.
//! Sub-case C: the human never answers and the turn is cancelled.
//!
//! The producer keeps the answered topic as a run variable, so a later turn
//! of the same run goes straight to the reporter.

use std::sync::Arc;

use agentic_audit::InMemoryEventLog;
use agentic_contracts::error::AgenticResult;
use agentic_core::{Agent, AgentRegistry, Engine, InMemoryStore, InterruptTool};

use crate::{
    mock_data::query_news_tool,
    models::{producer_model, reporter_model, EDITOR_TOOL, HUMAN_INPUT_TOOL, TOPIC_VAR},
};

use super::{drive_turn, print_summary, Desk, HumanInput, ScriptedAnswers};

pub const PRODUCER_WELCOME: &str =
    "I am the news producer. Tell me the topic, and I'll get the news from my reporter.";

/// Input that opens the producer's turn.
pub const OPENING_INPUT: &str = "Start the news desk";

pub fn setup() -> AgenticResult<Desk> {
    let registry = AgentRegistry::new();

    let reporter = registry.register(
        Agent::new("News Reporter")
            .instructions(
                "Fetch the latest headlines for the given topic with query_news.\n\
                 If there are none, ask the editor for another topic.",
            )
            .model("reporter")
            .tool(query_news_tool())
            .tool(InterruptTool::new(
                EDITOR_TOOL,
                "Ask the editor for a different topic.",
            )),
    )?;
    let producer = registry.register(
        Agent::new("Producer")
            .instructions(
                "Call the human to get the news topic, call the news reporter with it, \
                 then print a one-sentence summary.",
            )
            .model("producer")
            .welcome(PRODUCER_WELCOME)
            .tool(
                InterruptTool::new(HUMAN_INPUT_TOOL, "Ask the human for the news topic.")
                    .remembering(TOPIC_VAR),
            ),
    )?;
    registry.add_child(&producer, &reporter)?;

    let log = Arc::new(InMemoryEventLog::new("scenario-news"));
    let memory = Arc::new(InMemoryStore::new());
    let engine = Engine::builder()
        .agents(registry)
        .memory(memory.clone())
        .model("producer", Arc::new(producer_model()))
        .model("reporter", Arc::new(reporter_model()))
        .sink(log.clone())
        .build();

    Ok(Desk {
        engine,
        root: producer,
        log,
        memory,
    })
}

/// One producer turn with answers from `human`.
pub fn run_desk(human: &mut dyn HumanInput) -> AgenticResult<()> {
    let desk = setup()?;
    let mut runner = desk.runner()?;
    if let Some(welcome) = runner.welcome() {
        println!("  {}", welcome);
    }

    let report = drive_turn(&mut runner, OPENING_INPUT, human)?;
    print_summary(&report, &desk.log);
    runner.close()?;
    Ok(())
}

/// Run Scenario 2: News Producer, three sub-cases.
pub fn run_scenario() -> AgenticResult<()> {
    println!("=== Scenario 2: News Producer ===");
    println!();

    let cases: [(&str, &[&str]); 3] = [
        ("Sub-case A: the human picks a covered topic", &["AI"]),
        (
            "Sub-case B: no headlines, the reporter asks the editor",
            &["knitting", "climate"],
        ),
        ("Sub-case C: the human never answers", &[]),
    ];

    for (title, answers) in cases {
        println!("  {}", title);
        run_desk(&mut ScriptedAnswers::new(answers.iter().copied()))?;
        println!();
    }
    Ok(())
}
