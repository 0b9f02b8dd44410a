//! The sub-agent adapter: a child agent exposed to its parent as a tool.
//!
//! Invoking the tool runs the child's own turn in a fresh `AgentRunner` one
//! level deeper. The child's events go to the engine's sinks but never into
//! the parent's stream; the parent only sees the consolidated result. If the
//! child parks on an interrupt, the parked runner travels back to the parent
//! as `ToolOutcome::Delegated` and the interrupt surfaces at the top.

use serde_json::{json, Value};
use tracing::debug;

use agentic_contracts::{ids::AgentId, state::TurnState};

use crate::{
    context::RunContext,
    runner::AgentRunner,
    tool::{tool_name_for, ChildRun, ToolError, ToolKind, ToolOutcome},
    traits::Tool,
};

pub struct SubAgentTool {
    child: AgentId,
    name: String,
    description: String,
}

impl SubAgentTool {
    pub fn new(child: AgentId, child_name: &str, child_instructions: &str) -> Self {
        let summary = child_instructions
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");
        let description = if summary.is_empty() {
            format!("Delegate a request to the '{}' agent.", child_name)
        } else {
            format!("Delegate a request to the '{}' agent. {}", child_name, summary)
        };
        Self {
            child,
            name: tool_name_for(child_name),
            description,
        }
    }

    pub fn child(&self) -> &AgentId {
        &self.child
    }
}

impl Tool for SubAgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn argument_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "The request for the agent"
                }
            },
            "required": ["input"]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::SubAgent
    }

    fn invoke(&self, arguments: &Value, ctx: &RunContext) -> Result<ToolOutcome, ToolError> {
        let input = child_input(arguments);
        debug!(
            parent = %ctx.current_agent_id,
            child = %self.child,
            depth = ctx.depth + 1,
            "delegating to child agent"
        );

        let mut runner = AgentRunner::nested(ctx, self.child.clone());
        runner.start(&input)?;
        settle(runner)
    }
}

/// The child's input: a string `input`, `message` or `text` argument if
/// present, otherwise the JSON text of all arguments.
pub fn child_input(arguments: &Value) -> String {
    for key in ["input", "message", "text"] {
        if let Some(s) = arguments.get(key).and_then(Value::as_str) {
            return s.to_string();
        }
    }
    match arguments {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Drive a started or resumed child runner until it stops, and convert where
/// it stopped into the parent's tool outcome.
pub(crate) fn settle(mut runner: AgentRunner) -> Result<ToolOutcome, ToolError> {
    // The child's caller-facing events are deliberately dropped here; sinks
    // already saw them.
    let drained = runner.by_ref().count();
    debug!(
        child = %runner.agent_id(),
        depth = runner.depth(),
        drained,
        state = %runner.state(),
        "child agent settled"
    );

    match runner.state() {
        TurnState::Finished => Ok(ToolOutcome::text(
            runner.final_output().unwrap_or_default().to_string(),
        )),
        TurnState::AwaitingInput => Ok(ToolOutcome::Delegated(ChildRun(Box::new(runner)))),
        TurnState::Failed => Err(ToolError::new(
            runner
                .failure()
                .map(|e| format!("agent '{}' failed: {}", runner.agent_id(), e))
                .unwrap_or_else(|| format!("agent '{}' failed", runner.agent_id())),
        )),
        other => Err(ToolError::new(format!(
            "agent '{}' stopped in unexpected state '{}'",
            runner.agent_id(),
            other
        ))),
    }
}
