//! # agentic-core
//!
//! The turn-execution scheduler for hierarchical agents.
//!
//! This crate provides:
//! - The seam traits (`ModelClient`, `Tool`, `EventSink`, `MemoryStore`)
//! - The `AgentRegistry` that owns agent configuration and the agent tree
//! - The `AgentRunner` that drives one agent's turns as a pull-based event
//!   stream, including nested sub-agent calls and human interrupts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentic_core::{Agent, AgentRegistry, Engine};
//!
//! let registry = AgentRegistry::new();
//! let id = registry.register(Agent::new("Assistant").model("gpt"))?;
//! let engine = Engine::builder().agents(registry).model("gpt", client).build();
//!
//! let mut runner = engine.runner(&id)?;
//! runner.start("hello")?;
//! for event in runner.by_ref() {
//!     println!("{}", event);
//! }
//! ```

pub mod agent;
pub mod context;
pub mod engine;
pub mod memory;
pub mod model;
pub mod runner;
pub mod subagent;
pub mod tool;
pub mod traits;
pub mod turn;

pub use agent::{Agent, AgentRegistry, AgentSnapshot};
pub use context::{RunContext, RunVars};
pub use engine::{Engine, EngineBuilder};
pub use memory::InMemoryStore;
pub use model::{FnModel, ModelRouter, ScriptedModel};
pub use runner::AgentRunner;
pub use tool::{FunctionTool, InterruptTool, ToolEmission, ToolError, ToolKind, ToolOutcome};
pub use turn::RunnerCheckpoint;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for the unit tests of this crate.

    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use agentic_contracts::{
        error::{AgenticError, AgenticResult},
        event::{Event, EventKind},
        ids::{AgentId, RunId, TurnId},
    };

    use crate::{
        agent::{Agent, AgentRegistry},
        context::{RunContext, RunVars},
        engine::Engine,
        model::ScriptedModel,
        tool::FunctionTool,
        traits::EventSink,
    };

    pub fn echo_tool() -> FunctionTool {
        FunctionTool::from_fn(
            "echo",
            "Echo the `x` argument back",
            json!({
                "type": "object",
                "properties": { "x": { "type": "string" } }
            }),
            |args, _ctx| Ok(args["x"].clone()),
        )
    }

    /// An engine with one agent ("assistant") that owns `echo` and runs on an
    /// empty scripted model.
    pub fn single_agent_engine() -> (Arc<Engine>, AgentId) {
        let registry = AgentRegistry::new();
        let id = registry
            .register(Agent::new("Assistant").model("scripted").tool(echo_tool()))
            .unwrap();
        let engine = Engine::builder()
            .agents(registry)
            .model("scripted", Arc::new(ScriptedModel::new("scripted")))
            .build();
        (engine, id)
    }

    pub fn context_for(engine: &Arc<Engine>, agent: &AgentId) -> RunContext {
        RunContext {
            run_id: RunId::new(),
            turn_id: TurnId::new(),
            current_agent_id: agent.clone(),
            calling_user_id: "tester".to_string(),
            depth: 0,
            vars: RunVars::default(),
            engine: engine.clone(),
        }
    }

    pub fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    /// Sink that keeps everything it is given, or rejects every write.
    pub struct RecordingSink {
        events: Mutex<Vec<Event>>,
        sealed: Mutex<Vec<(AgentId, TurnId)>>,
        failing: bool,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                sealed: Mutex::new(Vec::new()),
                failing: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::new()
            }
        }

        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn sealed(&self) -> Vec<(AgentId, TurnId)> {
            self.sealed.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn record(&self, event: &Event) -> AgenticResult<()> {
            if self.failing {
                return Err(AgenticError::SinkWriteFailed {
                    reason: "disk full".to_string(),
                });
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn seal(&self, agent_id: &AgentId, turn_id: &TurnId) -> AgenticResult<()> {
            self.sealed
                .lock()
                .unwrap()
                .push((agent_id.clone(), *turn_id));
            Ok(())
        }
    }
}
