//! The shared environment every runner of a run points at.
//!
//! An `Engine` bundles the agent registry, the model router, the memory store
//! and the event sinks. It is built once, shared as `Arc<Engine>`, and handed
//! to nested runners through their `RunContext`.

use std::sync::Arc;

use tracing::info;

use agentic_contracts::{
    error::AgenticResult,
    ids::{AgentId, RunId},
};

use crate::{
    agent::AgentRegistry,
    memory::InMemoryStore,
    model::ModelRouter,
    runner::AgentRunner,
    traits::{EventSink, MemoryStore, ModelClient},
};

pub struct Engine {
    agents: AgentRegistry,
    models: ModelRouter,
    memory: Arc<dyn MemoryStore>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn models(&self) -> &ModelRouter {
        &self.models
    }

    pub fn memory(&self) -> &Arc<dyn MemoryStore> {
        &self.memory
    }

    pub fn sinks(&self) -> &[Arc<dyn EventSink>] {
        &self.sinks
    }

    /// A fresh top-level runner for `agent`.
    pub fn runner(self: &Arc<Self>, agent: &AgentId) -> AgenticResult<AgentRunner> {
        AgentRunner::new(self.clone(), agent.clone())
    }

    /// Release the memory blocks of a run whose runner was dropped without
    /// `close`. Returns the number of blocks released.
    pub fn release_run(&self, run_id: &RunId) -> AgenticResult<usize> {
        let released = self.memory.release_run(run_id)?;
        info!(run_id = %run_id, released, "abandoned run released");
        Ok(released)
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    agents: Option<AgentRegistry>,
    models: ModelRouter,
    memory: Option<Arc<dyn MemoryStore>>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EngineBuilder {
    /// Use a pre-populated registry instead of an empty one.
    pub fn agents(mut self, registry: AgentRegistry) -> Self {
        self.agents = Some(registry);
        self
    }

    pub fn model(mut self, model_ref: impl Into<String>, client: Arc<dyn ModelClient>) -> Self {
        self.models.register(model_ref, client);
        self
    }

    /// Client used for any model reference without an exact registration.
    pub fn fallback_model(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.models.set_fallback(client);
        self
    }

    /// Defaults to an `InMemoryStore`.
    pub fn memory(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(store);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn build(self) -> Arc<Engine> {
        Arc::new(Engine {
            agents: self.agents.unwrap_or_default(),
            models: self.models,
            memory: self
                .memory
                .unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            sinks: self.sinks,
        })
    }
}
