//! Structural change requests.
//!
//! Tool code never edits an agent's configuration. It emits an
//! `AgentCommand`; the scheduler applies it to the calling agent after the
//! tool call returns and records the outcome as a `ConfigChange` event.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AgentCommand {
    /// Offer a previously disabled tool to the model again.
    EnableTool { tool: String },
    /// Hide a tool from the model without removing it.
    DisableTool { tool: String },
}

impl AgentCommand {
    pub fn tool(&self) -> &str {
        match self {
            AgentCommand::EnableTool { tool } | AgentCommand::DisableTool { tool } => tool,
        }
    }
}
