//! Per-invocation ambient data handed to every tool call.
//!
//! A `RunContext` is passed explicitly on every call boundary; there is no
//! ambient "current agent" lookup anywhere in the runtime. Nested hops clone
//! it and change only the agent, turn and depth.

use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use serde_json::{Map, Value};

use agentic_contracts::{
    error::AgenticResult,
    ids::{AgentId, BlockId, RunId, TurnId},
    memory::MemoryBlock,
};

use crate::{engine::Engine, traits::MemoryStore};

/// Keyed variables of one run, shared by the top-level runner and every
/// nested runner below it.
#[derive(Debug, Clone, Default)]
pub struct RunVars(Arc<RwLock<BTreeMap<String, Value>>>);

impl RunVars {
    pub(crate) fn from_map(values: BTreeMap<String, Value>) -> Self {
        Self(Arc::new(RwLock::new(values)))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// A copy of every variable, in key order.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn merge(&self, values: &Map<String, Value>) {
        let mut vars = self.0.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in values {
            vars.insert(key.clone(), value.clone());
        }
    }
}

#[derive(Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub turn_id: TurnId,
    pub current_agent_id: AgentId,
    pub calling_user_id: String,
    pub depth: u32,
    pub(crate) vars: RunVars,
    pub(crate) engine: Arc<Engine>,
}

impl RunContext {
    /// A run variable, as last written by any agent of this run.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.vars.get(key)
    }

    pub fn vars(&self) -> &RunVars {
        &self.vars
    }

    /// The shared memory-block store of this run.
    pub fn memory(&self) -> &dyn MemoryStore {
        self.engine.memory().as_ref()
    }

    /// Store `content` as a block owned by the current agent.
    pub fn store_block(&self, content: impl Into<String>) -> AgenticResult<BlockId> {
        self.memory()
            .put(&self.current_agent_id, &self.run_id, content.into())
    }

    pub fn fetch_block(&self, block_id: &BlockId) -> AgenticResult<MemoryBlock> {
        self.memory().get(block_id)
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("turn_id", &self.turn_id)
            .field("current_agent_id", &self.current_agent_id)
            .field("calling_user_id", &self.calling_user_id)
            .field("depth", &self.depth)
            .field("vars", &self.vars.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{context_for, single_agent_engine};

    #[test]
    fn run_vars_are_shared_between_clones() {
        let (engine, agent) = single_agent_engine();
        let ctx = context_for(&engine, &agent);
        let nested = ctx.clone();

        let mut values = Map::new();
        values.insert("topic".to_string(), json!("climate"));
        nested.vars().merge(&values);

        assert_eq!(ctx.get("topic"), Some(json!("climate")));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn merge_overwrites_only_the_given_keys() {
        let vars = RunVars::from_map(BTreeMap::from([
            ("topic".to_string(), json!("ai")),
            ("desk".to_string(), json!("night")),
        ]));
        let mut values = Map::new();
        values.insert("topic".to_string(), json!("sports"));
        vars.merge(&values);

        assert_eq!(
            vars.snapshot(),
            BTreeMap::from([
                ("desk".to_string(), json!("night")),
                ("topic".to_string(), json!("sports")),
            ])
        );
    }
}
