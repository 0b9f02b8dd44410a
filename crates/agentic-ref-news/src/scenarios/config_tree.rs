//! Scenario 4: Configured Desk
//!
//! The news desk declared in TOML and installed through `agentic-config`.
//! Model references with a dedicated stand-in get it; any other reference
//! falls back to the tool-walking model.
//!
//! The turn parks on the producer's question, is checkpointed to JSON,
//! restored into a fresh runner and answered there.

use std::{path::Path, sync::Arc};

use tracing::info;

use agentic_audit::InMemoryEventLog;
use agentic_config::AgentTreeConfig;
use agentic_contracts::{
    error::{AgenticError, AgenticResult},
    state::TurnState,
};
use agentic_core::{AgentRegistry, AgentRunner, Engine, InMemoryStore, RunnerCheckpoint};

use crate::{
    mock_data::newsroom_catalog,
    models::{producer_model, reporter_model, researcher_model, walker_model, writer_model},
};

use super::{drive_turn, print_summary, Desk, HumanInput, ScriptedAnswers, TurnReport};

/// The news desk as a configuration document.
pub const NEWS_DESK_TOML: &str = r#"
[runner]
user_id = "night-editor"

[[agents]]
name = "Producer"
instructions = "Call the human to get the news topic, call the news reporter with it, then print a one-sentence summary."
model = "producer"
interrupt_tools = ["get_human_input"]
children = ["News Reporter"]
root = true
welcome = "I am the news producer. Tell me the topic, and I'll get the news from my reporter."

[[agents]]
name = "News Reporter"
instructions = "Fetch the latest headlines for the given topic with query_news."
model = "reporter"
tools = ["query_news"]
"#;

/// Install `config` with the newsroom catalog and wire an engine around it.
pub fn setup_from(config: &AgentTreeConfig) -> AgenticResult<Desk> {
    let registry = AgentRegistry::new();
    let tree = config.install(&registry, &newsroom_catalog())?;

    let log = Arc::new(InMemoryEventLog::new("scenario-config"));
    let memory = Arc::new(InMemoryStore::new());
    let engine = Engine::builder()
        .agents(registry)
        .memory(memory.clone())
        .model("producer", Arc::new(producer_model()))
        .model("reporter", Arc::new(reporter_model()))
        .model("researcher", Arc::new(researcher_model()))
        .model("writer", Arc::new(writer_model()))
        .fallback_model(Arc::new(walker_model()))
        .sink(log.clone())
        .build();

    Ok(Desk {
        engine,
        root: tree.root,
        log,
        memory,
    })
}

/// Load a tree from `path` and drive one turn of its root agent.
pub fn run_file(path: &Path, input: &str, human: &mut dyn HumanInput) -> AgenticResult<()> {
    let config = AgentTreeConfig::from_file(path)?;
    info!(path = %path.display(), agents = config.agents.len(), "agent tree loaded");

    let desk = setup_from(&config)?;
    let mut runner = desk.runner()?.with_user(config.runner.user_id.clone());
    if let Some(welcome) = runner.welcome() {
        println!("  {}", welcome);
    }

    let report = drive_turn(&mut runner, input, human)?;
    print_summary(&report, &desk.log);
    runner.close()?;
    Ok(())
}

/// Serialize a parked runner and rebuild it on the same engine.
pub fn checkpoint_round_trip(desk: &Desk, runner: &AgentRunner) -> AgenticResult<AgentRunner> {
    let json = runner.checkpoint().to_json()?;
    println!("  Checkpoint: {} bytes of JSON", json.len());
    AgentRunner::restore(desk.engine.clone(), RunnerCheckpoint::from_json(&json)?)
}

/// Run Scenario 4: Configured Desk.
pub fn run_scenario() -> AgenticResult<()> {
    println!("=== Scenario 4: Configured Desk ===");
    println!();

    let config = AgentTreeConfig::from_toml_str(NEWS_DESK_TOML)?;
    let desk = setup_from(&config)?;
    println!(
        "  Installed {} agents; root '{}' offers: {}",
        config.agents.len(),
        desk.root,
        desk.engine.agents().tool_names(&desk.root)?.join(", ")
    );

    let mut runner = desk.runner()?.with_user(config.runner.user_id.clone());
    runner.start("Start the news desk")?;
    for event in runner.by_ref() {
        println!("    {}", event);
    }
    if runner.state() != TurnState::AwaitingInput {
        return Err(AgenticError::StateMachine {
            reason: format!("expected the desk to park, found '{}'", runner.state()),
        });
    }

    let mut restored = checkpoint_round_trip(&desk, &runner)?;
    drop(runner);
    println!("  Restored runner is {}; answering there", restored.state());
    restored.continue_with("climate")?;
    let events = restored.drain();
    for event in &events {
        println!("    {}", event);
    }

    let report = TurnReport {
        events,
        state: restored.state(),
        final_output: restored.final_output().map(str::to_string),
        interrupts: 1,
        usage: *restored.usage(),
    };
    print_summary(&report, &desk.log);
    restored.close()?;

    println!();
    println!("  Same tree, answered without a checkpoint:");
    let mut runner = desk.runner()?.with_user(config.runner.user_id.clone());
    let report = drive_turn(
        &mut runner,
        "Start the news desk",
        &mut ScriptedAnswers::new(["sports"]),
    )?;
    print_summary(&report, &desk.log);
    runner.close()?;
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use agentic_contracts::event::EventKind;

    use super::*;

    #[test]
    fn test_installed_tree_matches_the_coded_desk() {
        let config = AgentTreeConfig::from_toml_str(NEWS_DESK_TOML).unwrap();
        let desk = setup_from(&config).unwrap();
        let mut runner = desk.runner().unwrap().with_user(config.runner.user_id.clone());

        assert_eq!(runner.user_id(), "night-editor");
        assert!(runner.welcome().unwrap().starts_with("I am the news producer"));

        let report =
            drive_turn(&mut runner, "go", &mut ScriptedAnswers::new(["sports"])).unwrap();
        assert_eq!(report.state, TurnState::Finished);
        assert!(report
            .final_output
            .unwrap()
            .starts_with("Summary: Top stories on sports: Underdog rowing club"));
    }

    #[test]
    fn test_restored_runner_finishes_the_parked_turn() {
        let config = AgentTreeConfig::from_toml_str(NEWS_DESK_TOML).unwrap();
        let desk = setup_from(&config).unwrap();
        let mut runner = desk.runner().unwrap();
        runner.start("go").unwrap();
        runner.drain();
        assert_eq!(runner.state(), TurnState::AwaitingInput);
        let turn_id = runner.turn_id();

        let mut restored = checkpoint_round_trip(&desk, &runner).unwrap();
        assert_eq!(restored.state(), TurnState::AwaitingInput);
        assert_eq!(restored.turn_id(), turn_id);

        restored.continue_with("AI").unwrap();
        let events = restored.drain();
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::TurnComplete));
        assert!(restored.final_output().unwrap().contains("Regional hospitals"));

        // Sequence numbers continue where the checkpoint left off.
        let sequences: Vec<u64> = restored.events().iter().map(|e| e.sequence_no).collect();
        assert_eq!(sequences, (1..=sequences.len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_unmapped_model_falls_back_to_walker() {
        let config = AgentTreeConfig::from_toml_str(
            r#"
            [[agents]]
            name = "Wire Desk"
            model = "unmapped"
            tools = ["query_news"]
            "#,
        )
        .unwrap();
        let desk = setup_from(&config).unwrap();
        let mut runner = desk.runner().unwrap();
        let report = drive_turn(&mut runner, "climate", &mut ScriptedAnswers::default()).unwrap();

        assert_eq!(report.state, TurnState::Finished);
        let output = report.final_output.unwrap();
        assert!(output.starts_with("wire_desk gathered: query_news -> "));
        assert!(output.contains("Coastal city"));
    }

    #[test]
    fn test_run_file_reads_a_tree_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "agentic-ref-news-{}.toml",
            std::process::id()
        ));
        std::fs::File::create(&path)
            .unwrap()
            .write_all(NEWS_DESK_TOML.as_bytes())
            .unwrap();

        run_file(&path, "go", &mut ScriptedAnswers::new(["AI"])).unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_run_file_reports_missing_file() {
        let result = run_file(
            Path::new("/nonexistent/desk.toml"),
            "go",
            &mut ScriptedAnswers::default(),
        );
        assert!(matches!(result, Err(AgenticError::Config { .. })));
    }

    #[test]
    fn test_shipped_agent_files_install_and_run() {
        let news = AgentTreeConfig::from_toml_str(include_str!("../../../../agents/news.toml"))
            .unwrap();
        let desk = setup_from(&news).unwrap();
        let mut runner = desk.runner().unwrap();
        let report = drive_turn(
            &mut runner,
            "go",
            &mut ScriptedAnswers::new(["knitting", "climate"]),
        )
        .unwrap();
        assert_eq!(report.interrupts, 2);
        assert!(report.final_output.unwrap().contains("Coastal city"));

        let profiles =
            AgentTreeConfig::from_toml_str(include_str!("../../../../agents/profiles.toml"))
                .unwrap();
        let desk = setup_from(&profiles).unwrap();
        let mut runner = desk.runner().unwrap();
        let report =
            drive_turn(&mut runner, "Mara Quill", &mut ScriptedAnswers::default()).unwrap();
        assert!(report.final_output.unwrap().contains("marine engineer"));
        assert_eq!(runner.close().unwrap(), 1);
    }

    #[test]
    fn test_run_scenario() {
        run_scenario().unwrap();
    }
}
