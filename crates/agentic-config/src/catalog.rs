//! Named tools a configuration file may refer to.

use std::{collections::BTreeMap, sync::Arc};

use agentic_core::{memory::read_block_tool, traits::Tool};

/// Tools available to `AgentTreeConfig::install`, keyed by tool name.
///
/// The same tool instance is shared by every agent that lists it.
#[derive(Default, Clone)]
pub struct ToolCatalog {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the runtime's own tools (`read_memory_block`).
    pub fn with_builtins() -> Self {
        Self::new().with(read_block_tool())
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.insert(Arc::new(tool));
        self
    }

    /// Add a tool, replacing any tool of the same name.
    pub fn insert(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}
