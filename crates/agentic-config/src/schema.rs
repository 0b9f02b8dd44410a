//! Configuration schema for an agent tree.
//!
//! An `AgentTreeConfig` is deserialized from TOML. It holds optional runner
//! settings and the list of agents, each naming its model, its tools and its
//! children.
//!
//! Example:
//! ```toml
//! [runner]
//! user_id = "editor"
//!
//! [[agents]]
//! name = "News Producer"
//! instructions = "Ask the human which topic to cover, then delegate."
//! model = "producer"
//! interrupt_tools = ["ask_human"]
//! children = ["News Reporter"]
//! root = true
//!
//! [[agents]]
//! name = "News Reporter"
//! instructions = "Fetch the latest headlines for a topic."
//! model = "reporter"
//! tools = ["fetch_headlines"]
//! ```

use serde::{Deserialize, Serialize};

fn default_user() -> String {
    agentic_core::runner::ANONYMOUS_USER.to_string()
}

/// Settings applied to the top-level runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Forwarded to every tool call as `RunContext::calling_user_id`.
    #[serde(default = "default_user")]
    pub user_id: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            user_id: default_user(),
        }
    }
}

/// One agent of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display name; also the key other agents use in `children`.
    pub name: String,

    #[serde(default)]
    pub instructions: String,

    /// Model reference resolved by the engine's model router.
    pub model: String,

    /// Names of tools taken from the `ToolCatalog`.
    #[serde(default)]
    pub tools: Vec<String>,

    /// Names of human-input tools to create for this agent. Each one reads
    /// its prompt from the `msg` argument.
    #[serde(default)]
    pub interrupt_tools: Vec<String>,

    /// Names of the agents placed directly under this one.
    #[serde(default)]
    pub children: Vec<String>,

    /// Marks the agent the top-level runner drives. Optional when the tree
    /// has exactly one agent without a parent.
    #[serde(default)]
    pub root: bool,

    pub welcome: Option<String>,
}

/// The top-level structure deserialized from a TOML agent tree file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTreeConfig {
    #[serde(default)]
    pub runner: RunnerSettings,

    pub agents: Vec<AgentSpec>,
}
