//! Tool outcomes and the two generic tool adapters.
//!
//! `FunctionTool` wraps a closure; `InterruptTool` suspends the turn until the
//! caller answers. The third variant, the sub-agent tool, lives in
//! [`crate::subagent`] because it needs the runner.

use std::fmt;

use agentic_contracts::{command::AgentCommand, error::AgenticError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::{context::RunContext, runner::AgentRunner, traits::Tool};

/// A tool failure, reported to the model as an observation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ToolError {
    pub message: String,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AgenticError> for ToolError {
    fn from(err: AgenticError) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Function,
    /// Suspends the turn for external (human) input.
    Interrupt,
    /// Delegates to a child agent.
    SubAgent,
}

/// Something a tool surfaces before its terminal value.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEmission {
    /// Intermediate output, emitted as a `ToolOutput` event.
    Output(Value),
    /// A structural change the scheduler applies to the calling agent.
    Command(AgentCommand),
    /// Run variables to write, merged over the existing ones.
    SetState(Map<String, Value>),
}

/// A child runner parked on an interrupt.
///
/// Only the sub-agent adapter can build one; the scheduler keeps it as part
/// of the parent's pending batch and resumes it on `continue_with`.
pub struct ChildRun(pub(crate) Box<AgentRunner>);

impl fmt::Debug for ChildRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRun")
            .field("agent_id", self.0.agent_id())
            .field("depth", &self.0.depth())
            .field("state", &self.0.state())
            .finish()
    }
}

/// The normalized result of one tool invocation.
#[derive(Debug)]
pub enum ToolOutcome {
    /// A terminal value.
    Value(Value),
    /// Emissions in order, then the terminal value.
    Events {
        emissions: Vec<ToolEmission>,
        value: Value,
    },
    /// Park the turn until the caller supplies input; the input becomes the
    /// call's result, and is stored under the `remember` run variable if set.
    Suspend {
        prompt: String,
        remember: Option<String>,
    },
    /// A child agent suspended; its interrupt propagates upward.
    Delegated(ChildRun),
    /// The value is the call's result and the agent's final answer. The turn
    /// ends without another model decision.
    Finish(Value),
}

impl ToolOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutcome::Value(Value::String(text.into()))
    }
}

type Handler = dyn Fn(&Value, &RunContext) -> Result<ToolOutcome, ToolError> + Send + Sync;

/// A plain function tool backed by a closure.
pub struct FunctionTool {
    name: String,
    description: String,
    schema: Value,
    handler: Box<Handler>,
}

impl FunctionTool {
    /// Build a tool whose handler returns a full `ToolOutcome`.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(&Value, &RunContext) -> Result<ToolOutcome, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Box::new(handler),
        }
    }

    /// Build a tool whose handler returns a terminal value.
    pub fn from_fn<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(&Value, &RunContext) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self::new(name, description, schema, move |args, ctx| {
            handler(args, ctx).map(ToolOutcome::Value)
        })
    }
}

impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn argument_schema(&self) -> Value {
        self.schema.clone()
    }

    fn invoke(&self, arguments: &Value, ctx: &RunContext) -> Result<ToolOutcome, ToolError> {
        (self.handler)(arguments, ctx)
    }
}

/// A human-input tool.
///
/// Invoking it never blocks: it returns `ToolOutcome::Suspend` with the prompt
/// read from `prompt_field` of the arguments, and the caller's answer becomes
/// the call's result.
///
/// With `remembering(key)` the answer is also kept as a run variable, and
/// later calls in the same run return it without asking again. Empty
/// answers are kept but never reused.
pub struct InterruptTool {
    name: String,
    description: String,
    prompt_field: String,
    remember: Option<String>,
}

impl InterruptTool {
    pub const DEFAULT_PROMPT: &'static str = "Input required";

    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            prompt_field: "msg".to_string(),
            remember: None,
        }
    }

    /// Keep the answer in the run variable `key`.
    pub fn remembering(mut self, key: impl Into<String>) -> Self {
        self.remember = Some(key.into());
        self
    }

    /// Read the prompt from a different argument field (default: `msg`).
    pub fn with_prompt_field(mut self, field: impl Into<String>) -> Self {
        self.prompt_field = field.into();
        self
    }
}

impl Tool for InterruptTool {
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
                self.prompt_field.as_str(): {
                    "type": "string",
                    "description": "Question to show the human"
                }
            },
            "required": [self.prompt_field.as_str()]
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Interrupt
    }

    fn invoke(&self, arguments: &Value, ctx: &RunContext) -> Result<ToolOutcome, ToolError> {
        if let Some(known) = self.remember.as_deref().and_then(|key| ctx.get(key)) {
            match known {
                Value::Null => {}
                Value::String(s) if s.trim().is_empty() => {}
                value => return Ok(ToolOutcome::Value(value)),
            }
        }

        let prompt = match arguments.get(&self.prompt_field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => Self::DEFAULT_PROMPT.to_string(),
        };
        Ok(ToolOutcome::Suspend {
            prompt,
            remember: self.remember.clone(),
        })
    }
}

/// Derive a tool name from an agent name: lowercase, runs of anything that is
/// not ASCII alphanumeric collapsed to `_`.
///
/// `"News Reporter"` becomes `"news_reporter"`.
pub fn tool_name_for(agent_name: &str) -> String {
    let mut out = String::with_capacity(agent_name.len());
    for ch in agent_name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("agent");
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{context_for, single_agent_engine};

    #[test]
    fn tool_name_for_snake_cases_names() {
        assert_eq!(tool_name_for("News Reporter"), "news_reporter");
        assert_eq!(tool_name_for("writer"), "writer");
        assert_eq!(tool_name_for("  Data--Base Agent! "), "data_base_agent");
        assert_eq!(tool_name_for("???"), "agent");
    }

    #[test]
    fn function_tool_passes_arguments_through() {
        let (engine, agent) = single_agent_engine();
        let ctx = context_for(&engine, &agent);
        let echo = FunctionTool::from_fn(
            "echo",
            "Echo x back",
            json!({ "type": "object" }),
            |args, _ctx| Ok(args["x"].clone()),
        );

        match echo.invoke(&json!({ "x": "hi" }), &ctx).unwrap() {
            ToolOutcome::Value(v) => assert_eq!(v, json!("hi")),
            other => panic!("expected Value, got {:?}", other),
        }
        assert_eq!(echo.kind(), ToolKind::Function);
        assert_eq!(echo.schema().name, "echo");
    }

    #[test]
    fn interrupt_tool_suspends_with_prompt() {
        let (engine, agent) = single_agent_engine();
        let ctx = context_for(&engine, &agent);
        let ask = InterruptTool::new("ask_human", "Ask the human");

        match ask.invoke(&json!({ "msg": "pick one" }), &ctx).unwrap() {
            ToolOutcome::Suspend { prompt, remember } => {
                assert_eq!(prompt, "pick one");
                assert_eq!(remember, None);
            }
            other => panic!("expected Suspend, got {:?}", other),
        }
        assert_eq!(ask.kind(), ToolKind::Interrupt);
    }

    #[test]
    fn interrupt_tool_falls_back_to_default_prompt() {
        let (engine, agent) = single_agent_engine();
        let ctx = context_for(&engine, &agent);
        let ask = InterruptTool::new("ask", "Ask").with_prompt_field("question");

        match ask.invoke(&json!({}), &ctx).unwrap() {
            ToolOutcome::Suspend { prompt, .. } => {
                assert_eq!(prompt, InterruptTool::DEFAULT_PROMPT)
            }
            other => panic!("expected Suspend, got {:?}", other),
        }
        assert_eq!(ask.argument_schema()["required"], json!(["question"]));
    }

    #[test]
    fn remembering_interrupt_reuses_a_known_answer() {
        let (engine, agent) = single_agent_engine();
        let ctx = context_for(&engine, &agent);
        let ask = InterruptTool::new("get_topic", "Ask for a topic").remembering("topic");

        match ask.invoke(&json!({ "msg": "topic?" }), &ctx).unwrap() {
            ToolOutcome::Suspend { remember, .. } => assert_eq!(remember.as_deref(), Some("topic")),
            other => panic!("expected Suspend, got {:?}", other),
        }

        let mut values = Map::new();
        values.insert("topic".to_string(), json!("   "));
        ctx.vars().merge(&values);
        assert!(matches!(
            ask.invoke(&json!({}), &ctx).unwrap(),
            ToolOutcome::Suspend { .. }
        ));

        values.insert("topic".to_string(), json!("climate"));
        ctx.vars().merge(&values);
        match ask.invoke(&json!({}), &ctx).unwrap() {
            ToolOutcome::Value(v) => assert_eq!(v, json!("climate")),
            other => panic!("expected Value, got {:?}", other),
        }
    }

    #[test]
    fn tool_error_from_agentic_error_keeps_message() {
        let err: ToolError = AgenticError::UnknownBlock {
            block_id: "b-1".to_string(),
        }
        .into();
        assert!(err.message.contains("b-1"));
    }
}
