//! Loading, validating and installing an agent tree.
//!
//! Installation algorithm:
//!
//! 1. Validate the document on its own: unique names, known children, one
//!    parent per agent, a single root from which every agent is reachable.
//! 2. Resolve every tool name against the `ToolCatalog` and check that no
//!    agent would end up with two tools of the same name.
//! 3. Register every agent, then attach the children in declaration order.
//!
//! Steps 1 and 2 touch nothing; a document that passes them installs without
//! registry errors.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use tracing::{debug, info};

use agentic_contracts::{
    error::{AgenticError, AgenticResult},
    ids::AgentId,
};
use agentic_core::{
    tool::{tool_name_for, InterruptTool},
    traits::Tool,
    Agent, AgentRegistry,
};

use crate::{
    catalog::ToolCatalog,
    schema::{AgentSpec, AgentTreeConfig},
};

fn config_err(reason: impl Into<String>) -> AgenticError {
    AgenticError::Config {
        reason: reason.into(),
    }
}

/// Ids assigned to the agents of an installed tree.
#[derive(Debug, Clone)]
pub struct InstalledTree {
    pub root: AgentId,
    /// Agent name from the document to registry id.
    pub ids: HashMap<String, AgentId>,
}

impl InstalledTree {
    pub fn id_of(&self, name: &str) -> Option<&AgentId> {
        self.ids.get(name)
    }
}

impl AgentTreeConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `AgenticError::Config` if the TOML is malformed or does not
    /// match the schema. The tree itself is checked by `validate`.
    pub fn from_toml_str(s: &str) -> AgenticResult<Self> {
        toml::from_str(s).map_err(|e| config_err(format!("failed to parse agent tree TOML: {}", e)))
    }

    pub fn from_file(path: &Path) -> AgenticResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            config_err(format!(
                "failed to read agent tree file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    fn spec(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Distinct model references used by the tree, in declaration order.
    pub fn model_refs(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.agents
            .iter()
            .map(|a| a.model.as_str())
            .filter(|m| seen.insert(*m))
            .collect()
    }

    /// Check the tree's shape and return the root's name.
    pub fn validate(&self) -> AgenticResult<&str> {
        if self.agents.is_empty() {
            return Err(config_err("agent tree declares no agents"));
        }

        let mut names = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(config_err("agent with an empty name"));
            }
            if !names.insert(agent.name.as_str()) {
                return Err(config_err(format!("agent '{}' is declared twice", agent.name)));
            }
            if agent.model.trim().is_empty() {
                return Err(config_err(format!("agent '{}' has no model", agent.name)));
            }
        }

        let mut parent_of: HashMap<&str, &str> = HashMap::new();
        for agent in &self.agents {
            for child in &agent.children {
                if !names.contains(child.as_str()) {
                    return Err(config_err(format!(
                        "agent '{}' lists unknown child '{}'",
                        agent.name, child
                    )));
                }
                if child == &agent.name {
                    return Err(config_err(format!(
                        "agent '{}' lists itself as a child",
                        agent.name
                    )));
                }
                if let Some(existing) = parent_of.insert(child.as_str(), agent.name.as_str()) {
                    return Err(config_err(format!(
                        "agent '{}' is a child of both '{}' and '{}'",
                        child, existing, agent.name
                    )));
                }
            }
        }

        let flagged: Vec<&str> = self
            .agents
            .iter()
            .filter(|a| a.root)
            .map(|a| a.name.as_str())
            .collect();
        let root = match flagged.as_slice() {
            [root] => *root,
            [] => {
                let parentless: Vec<&str> = self
                    .agents
                    .iter()
                    .map(|a| a.name.as_str())
                    .filter(|n| !parent_of.contains_key(n))
                    .collect();
                match parentless.as_slice() {
                    [root] => *root,
                    _ => {
                        return Err(config_err(
                            "cannot infer the root agent; mark exactly one agent with root = true",
                        ))
                    }
                }
            }
            _ => {
                return Err(config_err(format!(
                    "more than one root agent: {}",
                    flagged.join(", ")
                )))
            }
        };
        if let Some(parent) = parent_of.get(root) {
            return Err(config_err(format!(
                "root agent '{}' is also a child of '{}'",
                root, parent
            )));
        }

        // One parent per agent plus reachability from the root rules out
        // cycles and stray subtrees.
        let mut reached = HashSet::new();
        let mut stack = vec![root];
        while let Some(name) = stack.pop() {
            if reached.insert(name) {
                if let Some(spec) = self.spec(name) {
                    stack.extend(spec.children.iter().map(String::as_str));
                }
            }
        }
        if let Some(stray) = self.agents.iter().find(|a| !reached.contains(a.name.as_str())) {
            return Err(config_err(format!(
                "agent '{}' is not reachable from root '{}'",
                stray.name, root
            )));
        }

        Ok(root)
    }

    /// The tools of `spec`, resolved against `catalog`.
    fn resolve_tools(
        &self,
        spec: &AgentSpec,
        catalog: &ToolCatalog,
    ) -> AgenticResult<Vec<Arc<dyn Tool>>> {
        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
        for name in &spec.tools {
            let tool = catalog.get(name).ok_or_else(|| {
                config_err(format!(
                    "agent '{}' uses tool '{}', which is not in the catalog (available: {})",
                    spec.name,
                    name,
                    catalog.names().join(", ")
                ))
            })?;
            tools.push(tool.clone());
        }
        for name in &spec.interrupt_tools {
            tools.push(Arc::new(InterruptTool::new(
                name.clone(),
                format!("Ask the human a question on behalf of {}.", spec.name),
            )));
        }

        let mut seen = HashSet::new();
        let child_tools = spec.children.iter().map(|c| tool_name_for(c));
        for name in tools.iter().map(|t| t.name().to_string()).chain(child_tools) {
            if !seen.insert(name.clone()) {
                return Err(config_err(format!(
                    "agent '{}' would have two tools named '{}'",
                    spec.name, name
                )));
            }
        }
        Ok(tools)
    }

    /// Validate the tree and install it into `registry`.
    pub fn install(
        &self,
        registry: &AgentRegistry,
        catalog: &ToolCatalog,
    ) -> AgenticResult<InstalledTree> {
        let root = self.validate()?;

        let mut resolved = Vec::with_capacity(self.agents.len());
        for spec in &self.agents {
            resolved.push((spec, self.resolve_tools(spec, catalog)?));
        }

        let mut ids = HashMap::new();
        for (spec, tools) in resolved {
            let mut agent = Agent::new(spec.name.clone())
                .instructions(spec.instructions.clone())
                .model(spec.model.clone());
            if let Some(welcome) = &spec.welcome {
                agent = agent.welcome(welcome.clone());
            }
            for tool in tools {
                agent = agent.shared_tool(tool);
            }
            let id = registry.register(agent)?;
            debug!(name = %spec.name, agent_id = %id, "agent installed");
            ids.insert(spec.name.clone(), id);
        }

        for spec in &self.agents {
            for child in &spec.children {
                let (Some(parent_id), Some(child_id)) = (ids.get(&spec.name), ids.get(child))
                else {
                    return Err(config_err(format!(
                        "agent '{}' or '{}' missing after registration",
                        spec.name, child
                    )));
                };
                registry.add_child(parent_id, child_id)?;
            }
        }

        let root_id = ids
            .get(root)
            .cloned()
            .ok_or_else(|| config_err(format!("root agent '{}' missing after registration", root)))?;

        info!(
            root = %root_id,
            agents = ids.len(),
            "agent tree installed"
        );

        Ok(InstalledTree { root: root_id, ids })
    }
}
