//! Agent definitions and the arena-style agent registry.
//!
//! Agents live in one `AgentRegistry`, addressed by `AgentId`. Parent/child
//! relations are stored as id edges, and every child is exposed to its parent
//! as a synthesized sub-agent tool. The registry is the only writer of agent
//! configuration: `add_tool`, `remove_tool`, `add_child`, `remove_child` and
//! `set_tool_enabled` are serialized behind one lock. Runners never hold
//! that lock across a model or tool call. They take an `AgentSnapshot` at each
//! decision step, so a mutation only takes effect at the next step.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::{debug, info};

use agentic_contracts::{
    command::AgentCommand,
    error::{AgenticError, AgenticResult},
    ids::AgentId,
    model::ToolSchema,
};

use crate::{
    subagent::SubAgentTool,
    tool::tool_name_for,
    traits::Tool,
};

/// Declarative description of an agent, handed to `AgentRegistry::register`.
pub struct Agent {
    pub name: String,
    pub instructions: String,
    pub model_ref: String,
    /// Shown to the human before the first turn, if set.
    pub welcome: Option<String>,
    tools: Vec<Arc<dyn Tool>>,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: String::new(),
            model_ref: String::new(),
            welcome: None,
            tools: Vec::new(),
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn model(mut self, model_ref: impl Into<String>) -> Self {
        self.model_ref = model_ref.into();
        self
    }

    pub fn welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = Some(welcome.into());
        self
    }

    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }
}

struct ToolSlot {
    tool: Arc<dyn Tool>,
    enabled: bool,
    /// Set when the tool was synthesized for a child agent.
    child: Option<AgentId>,
}

struct AgentNode {
    id: AgentId,
    name: String,
    instructions: String,
    model_ref: String,
    welcome: Option<String>,
    tools: BTreeMap<String, ToolSlot>,
    children: Vec<AgentId>,
    parent: Option<AgentId>,
    /// Bumped on every configuration change.
    version: u64,
}

impl AgentNode {
    fn touch(&mut self) {
        self.version += 1;
    }
}

/// An immutable view of one agent's configuration at a decision step.
#[derive(Clone)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub name: String,
    pub instructions: String,
    pub model_ref: String,
    pub version: u64,
    /// Enabled tools only, keyed by name.
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl AgentSnapshot {
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Schemas of the enabled tools, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }
}

#[derive(Default)]
struct RegistryState {
    nodes: HashMap<AgentId, AgentNode>,
}

impl RegistryState {
    fn node(&self, id: &AgentId) -> AgenticResult<&AgentNode> {
        self.nodes.get(id).ok_or_else(|| unknown_agent(id))
    }

    fn node_mut(&mut self, id: &AgentId) -> AgenticResult<&mut AgentNode> {
        self.nodes.get_mut(id).ok_or_else(|| unknown_agent(id))
    }

    /// Parent, grandparent, … up to the root.
    fn ancestors(&self, id: &AgentId) -> AgenticResult<Vec<AgentId>> {
        let mut out = Vec::new();
        let mut cursor = self.node(id)?.parent.clone();
        while let Some(parent) = cursor {
            cursor = self.node(&parent)?.parent.clone();
            out.push(parent);
        }
        Ok(out)
    }
}

fn unknown_agent(id: &AgentId) -> AgenticError {
    AgenticError::UnknownAgent {
        agent: id.to_string(),
    }
}

/// Owner of every agent in an engine.
#[derive(Default)]
pub struct AgentRegistry {
    state: RwLock<RegistryState>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AgenticResult<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|e| AgenticError::StateMachine {
            reason: format!("agent registry lock poisoned: {}", e),
        })
    }

    fn write(&self) -> AgenticResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|e| AgenticError::StateMachine {
            reason: format!("agent registry lock poisoned: {}", e),
        })
    }

    /// Register an agent and return its id.
    ///
    /// The id is the snake-cased name, suffixed with a counter if another
    /// agent already uses it. Fails with `DuplicateTool` if two of the
    /// agent's tools share a name.
    pub fn register(&self, agent: Agent) -> AgenticResult<AgentId> {
        let mut state = self.write()?;

        let base = tool_name_for(&agent.name);
        let mut id = AgentId::new(base.clone());
        let mut n = 2;
        while state.nodes.contains_key(&id) {
            id = AgentId::new(format!("{}_{}", base, n));
            n += 1;
        }

        let mut tools = BTreeMap::new();
        for tool in agent.tools {
            let name = tool.name().to_string();
            if tools.contains_key(&name) {
                return Err(AgenticError::DuplicateTool {
                    agent: agent.name.clone(),
                    tool: name,
                });
            }
            tools.insert(
                name,
                ToolSlot {
                    tool,
                    enabled: true,
                    child: None,
                },
            );
        }

        info!(agent_id = %id, name = %agent.name, tools = tools.len(), "agent registered");

        state.nodes.insert(
            id.clone(),
            AgentNode {
                id: id.clone(),
                name: agent.name,
                instructions: agent.instructions,
                model_ref: agent.model_ref,
                welcome: agent.welcome,
                tools,
                children: Vec::new(),
                parent: None,
                version: 0,
            },
        );
        Ok(id)
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.read().map(|s| s.nodes.contains_key(id)).unwrap_or(false)
    }

    pub fn name_of(&self, id: &AgentId) -> AgenticResult<String> {
        Ok(self.read()?.node(id)?.name.clone())
    }

    pub fn welcome_of(&self, id: &AgentId) -> AgenticResult<Option<String>> {
        Ok(self.read()?.node(id)?.welcome.clone())
    }

    pub fn parent_of(&self, id: &AgentId) -> AgenticResult<Option<AgentId>> {
        Ok(self.read()?.node(id)?.parent.clone())
    }

    pub fn children_of(&self, id: &AgentId) -> AgenticResult<Vec<AgentId>> {
        Ok(self.read()?.node(id)?.children.clone())
    }

    /// Parent first, root last.
    pub fn ancestors(&self, id: &AgentId) -> AgenticResult<Vec<AgentId>> {
        self.read()?.ancestors(id)
    }

    /// Names of every tool on the agent, enabled or not.
    pub fn tool_names(&self, id: &AgentId) -> AgenticResult<Vec<String>> {
        Ok(self.read()?.node(id)?.tools.keys().cloned().collect())
    }

    pub fn snapshot(&self, id: &AgentId) -> AgenticResult<AgentSnapshot> {
        let state = self.read()?;
        let node = state.node(id)?;
        Ok(AgentSnapshot {
            id: node.id.clone(),
            name: node.name.clone(),
            instructions: node.instructions.clone(),
            model_ref: node.model_ref.clone(),
            version: node.version,
            tools: node
                .tools
                .iter()
                .filter(|(_, slot)| slot.enabled)
                .map(|(name, slot)| (name.clone(), slot.tool.clone()))
                .collect(),
        })
    }

    pub fn add_tool(&self, id: &AgentId, tool: Arc<dyn Tool>) -> AgenticResult<()> {
        let mut state = self.write()?;
        let node = state.node_mut(id)?;
        let name = tool.name().to_string();
        if node.tools.contains_key(&name) {
            return Err(AgenticError::DuplicateTool {
                agent: node.name.clone(),
                tool: name,
            });
        }
        debug!(agent_id = %id, tool = %name, "tool added");
        node.tools.insert(
            name,
            ToolSlot {
                tool,
                enabled: true,
                child: None,
            },
        );
        node.touch();
        Ok(())
    }

    /// Remove a plain tool. Tools synthesized for children are refused with
    /// `ProtectedTool`; remove the child instead.
    pub fn remove_tool(&self, id: &AgentId, name: &str) -> AgenticResult<Arc<dyn Tool>> {
        let mut state = self.write()?;
        let node = state.node_mut(id)?;
        match node.tools.get(name) {
            None => {
                return Err(AgenticError::UnknownTool {
                    agent: node.name.clone(),
                    tool: name.to_string(),
                })
            }
            Some(slot) if slot.child.is_some() => {
                return Err(AgenticError::ProtectedTool {
                    agent: node.name.clone(),
                    tool: name.to_string(),
                })
            }
            Some(_) => {}
        }
        let slot = node.tools.remove(name).ok_or_else(|| AgenticError::StateMachine {
            reason: format!("tool '{}' vanished during removal", name),
        })?;
        node.touch();
        debug!(agent_id = %id, tool = %name, "tool removed");
        Ok(slot.tool)
    }

    pub fn set_tool_enabled(&self, id: &AgentId, name: &str, enabled: bool) -> AgenticResult<()> {
        let mut state = self.write()?;
        let node = state.node_mut(id)?;
        let agent_name = node.name.clone();
        let slot = node
            .tools
            .get_mut(name)
            .ok_or_else(|| AgenticError::UnknownTool {
                agent: agent_name,
                tool: name.to_string(),
            })?;
        if slot.enabled != enabled {
            slot.enabled = enabled;
            node.touch();
        }
        debug!(agent_id = %id, tool = %name, enabled, "tool availability changed");
        Ok(())
    }

    /// Apply a structural change requested by a tool of agent `id`.
    pub fn apply_command(&self, id: &AgentId, command: &AgentCommand) -> AgenticResult<()> {
        match command {
            AgentCommand::EnableTool { tool } => self.set_tool_enabled(id, tool, true),
            AgentCommand::DisableTool { tool } => self.set_tool_enabled(id, tool, false),
        }
    }

    /// Attach `child` under `parent` and expose it as a sub-agent tool.
    ///
    /// The edge and the tool are inserted together. On any error the tree is
    /// left untouched.
    pub fn add_child(&self, parent: &AgentId, child: &AgentId) -> AgenticResult<()> {
        let mut state = self.write()?;
        let parent_name = state.node(parent)?.name.clone();
        let child_node = state.node(child)?;
        let child_name = child_node.name.clone();

        if parent == child || state.ancestors(parent)?.contains(child) {
            return Err(AgenticError::Cycle {
                parent: parent_name,
                child: child_name,
            });
        }
        if let Some(existing) = &child_node.parent {
            return Err(AgenticError::AlreadyParented {
                child: child_name,
                parent: state.node(existing)?.name.clone(),
            });
        }

        let tool = SubAgentTool::new(child.clone(), &child_name, &child_node.instructions);
        let tool_name = tool.name().to_string();
        if state.node(parent)?.tools.contains_key(&tool_name) {
            return Err(AgenticError::DuplicateTool {
                agent: parent_name,
                tool: tool_name,
            });
        }

        let parent_node = state.node_mut(parent)?;
        parent_node.children.push(child.clone());
        parent_node.tools.insert(
            tool_name.clone(),
            ToolSlot {
                tool: Arc::new(tool),
                enabled: true,
                child: Some(child.clone()),
            },
        );
        parent_node.touch();
        state.node_mut(child)?.parent = Some(parent.clone());

        info!(parent = %parent, child = %child, tool = %tool_name, "child agent attached");
        Ok(())
    }

    /// Detach `child` from `parent`, removing its synthesized tool.
    pub fn remove_child(&self, parent: &AgentId, child: &AgentId) -> AgenticResult<()> {
        let mut state = self.write()?;
        state.node(child)?;
        let parent_node = state.node_mut(parent)?;
        if !parent_node.children.contains(child) {
            return Err(AgenticError::NotAChild {
                parent: parent_node.name.clone(),
                child: child.to_string(),
            });
        }
        parent_node.children.retain(|c| c != child);
        parent_node
            .tools
            .retain(|_, slot| slot.child.as_ref() != Some(child));
        parent_node.touch();
        state.node_mut(child)?.parent = None;

        info!(parent = %parent, child = %child, "child agent detached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tool::{FunctionTool, ToolKind};

    fn echo() -> FunctionTool {
        FunctionTool::from_fn("echo", "Echo x", json!({}), |args, _| Ok(args["x"].clone()))
    }

    fn registry_with(names: &[&str]) -> (AgentRegistry, Vec<AgentId>) {
        let registry = AgentRegistry::new();
        let ids = names
            .iter()
            .map(|n| registry.register(Agent::new(*n).model("m")).unwrap())
            .collect();
        (registry, ids)
    }

    #[test]
    fn register_assigns_readable_unique_ids() {
        let registry = AgentRegistry::new();
        let a = registry.register(Agent::new("News Reporter")).unwrap();
        let b = registry.register(Agent::new("News Reporter")).unwrap();
        assert_eq!(a.as_str(), "news_reporter");
        assert_eq!(b.as_str(), "news_reporter_2");
    }

    #[test]
    fn register_rejects_duplicate_tool_names() {
        let registry = AgentRegistry::new();
        let result = registry.register(Agent::new("a").tool(echo()).tool(echo()));
        assert!(matches!(result, Err(AgenticError::DuplicateTool { .. })));
    }

    #[test]
    fn add_and_remove_tool() {
        let (registry, ids) = registry_with(&["a"]);
        let a = &ids[0];

        registry.add_tool(a, Arc::new(echo())).unwrap();
        assert!(matches!(
            registry.add_tool(a, Arc::new(echo())),
            Err(AgenticError::DuplicateTool { .. })
        ));
        assert_eq!(registry.tool_names(a).unwrap(), vec!["echo".to_string()]);

        let removed = registry.remove_tool(a, "echo").unwrap();
        assert_eq!(removed.name(), "echo");
        assert!(matches!(
            registry.remove_tool(a, "echo"),
            Err(AgenticError::UnknownTool { .. })
        ));
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let (registry, ids) = registry_with(&["a"]);
        let a = &ids[0];
        registry.add_tool(a, Arc::new(echo())).unwrap();

        let before = registry.snapshot(a).unwrap();
        registry.remove_tool(a, "echo").unwrap();
        let after = registry.snapshot(a).unwrap();

        assert!(before.tool("echo").is_some());
        assert!(after.tool("echo").is_none());
        assert!(after.version > before.version);
    }

    #[test]
    fn add_child_synthesizes_sub_agent_tool() {
        let registry = AgentRegistry::new();
        let parent = registry.register(Agent::new("Producer")).unwrap();
        let child = registry
            .register(Agent::new("News Reporter").instructions("Fetch headlines."))
            .unwrap();

        registry.add_child(&parent, &child).unwrap();

        assert_eq!(registry.children_of(&parent).unwrap(), vec![child.clone()]);
        assert_eq!(registry.parent_of(&child).unwrap(), Some(parent.clone()));
        let snapshot = registry.snapshot(&parent).unwrap();
        let tool = snapshot.tool("news_reporter").expect("synthesized tool");
        assert_eq!(tool.kind(), ToolKind::SubAgent);
        assert!(tool.description().contains("Fetch headlines."));
    }

    #[test]
    fn add_child_rejects_cycles_and_leaves_tree_unchanged() {
        let (registry, ids) = registry_with(&["root", "mid", "leaf"]);
        let (root, mid, leaf) = (&ids[0], &ids[1], &ids[2]);
        registry.add_child(root, mid).unwrap();
        registry.add_child(mid, leaf).unwrap();

        // root is an ancestor of leaf.
        let err = registry.add_child(leaf, root).unwrap_err();
        assert!(matches!(err, AgenticError::Cycle { .. }));
        // self-edge.
        let err = registry.add_child(mid, mid).unwrap_err();
        assert!(matches!(err, AgenticError::Cycle { .. }));

        assert!(registry.children_of(leaf).unwrap().is_empty());
        assert!(registry.tool_names(leaf).unwrap().is_empty());
        assert_eq!(registry.parent_of(root).unwrap(), None);
        assert_eq!(
            registry.ancestors(leaf).unwrap(),
            vec![mid.clone(), root.clone()]
        );
    }

    #[test]
    fn add_child_rejects_second_parent() {
        let (registry, ids) = registry_with(&["p1", "p2", "c"]);
        registry.add_child(&ids[0], &ids[2]).unwrap();

        let err = registry.add_child(&ids[1], &ids[2]).unwrap_err();
        assert!(matches!(err, AgenticError::AlreadyParented { .. }));
        assert!(registry.children_of(&ids[1]).unwrap().is_empty());
    }

    #[test]
    fn add_child_rejects_tool_name_collision() {
        let registry = AgentRegistry::new();
        let parent = registry
            .register(Agent::new("p").tool(FunctionTool::from_fn(
                "writer",
                "not an agent",
                json!({}),
                |_, _| Ok(json!(null)),
            )))
            .unwrap();
        let child = registry.register(Agent::new("Writer")).unwrap();

        let err = registry.add_child(&parent, &child).unwrap_err();
        assert!(matches!(err, AgenticError::DuplicateTool { .. }));
        assert_eq!(registry.parent_of(&child).unwrap(), None);
    }

    #[test]
    fn remove_child_removes_edge_and_tool() {
        let (registry, ids) = registry_with(&["p", "writer"]);
        let (p, w) = (&ids[0], &ids[1]);
        registry.add_child(p, w).unwrap();

        assert!(matches!(
            registry.remove_tool(p, "writer"),
            Err(AgenticError::ProtectedTool { .. })
        ));

        registry.remove_child(p, w).unwrap();
        assert!(registry.children_of(p).unwrap().is_empty());
        assert!(registry.tool_names(p).unwrap().is_empty());
        assert_eq!(registry.parent_of(w).unwrap(), None);

        assert!(matches!(
            registry.remove_child(p, w),
            Err(AgenticError::NotAChild { .. })
        ));
    }

    #[test]
    fn disabled_tools_are_hidden_from_snapshots() {
        let (registry, ids) = registry_with(&["a"]);
        let a = &ids[0];
        registry.add_tool(a, Arc::new(echo())).unwrap();

        registry
            .apply_command(a, &AgentCommand::DisableTool { tool: "echo".to_string() })
            .unwrap();
        assert!(registry.snapshot(a).unwrap().schemas().is_empty());
        assert_eq!(registry.tool_names(a).unwrap(), vec!["echo".to_string()]);

        registry
            .apply_command(a, &AgentCommand::EnableTool { tool: "echo".to_string() })
            .unwrap();
        assert_eq!(registry.snapshot(a).unwrap().tool_names(), vec!["echo"]);

        assert!(matches!(
            registry.apply_command(a, &AgentCommand::EnableTool { tool: "nope".to_string() }),
            Err(AgenticError::UnknownTool { .. })
        ));
    }

    #[test]
    fn unknown_agent_is_reported() {
        let registry = AgentRegistry::new();
        let ghost = AgentId::new("ghost");
        assert!(matches!(
            registry.snapshot(&ghost),
            Err(AgenticError::UnknownAgent { .. })
        ));
        assert!(!registry.contains(&ghost));
    }
}
