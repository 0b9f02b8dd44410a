//! Trait definitions at the scheduler's seams.
//!
//! - `ModelClient`  — the completion service (opaque reasoning)
//! - `Tool`         — anything the model can call
//! - `EventSink`    — observer of every event at every depth
//! - `MemoryStore`  — shared block storage for large payloads
//!
//! The scheduler owns the control flow; implementations of these traits only
//! answer when asked.

use agentic_contracts::{
    error::AgenticResult,
    event::Event,
    ids::{AgentId, BlockId, RunId, TurnId},
    memory::MemoryBlock,
    model::{Completion, CompletionRequest, CompletionResponse, ToolSchema},
};
use serde_json::Value;

use crate::{
    context::RunContext,
    tool::{ToolError, ToolKind, ToolOutcome},
};

/// The language-model completion service.
///
/// Called once per decision step, never concurrently for the same turn.
/// A failure fails the turn; clients that enforce deadlines should report
/// them as `AgenticError::Timeout` rather than block forever.
pub trait ModelClient: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> AgenticResult<CompletionResponse>;

    /// The decision plus token counts and cost. The scheduler always calls
    /// this; clients that meter usage override it.
    fn complete_with_usage(&self, request: &CompletionRequest) -> AgenticResult<Completion> {
        self.complete(request).map(Completion::from)
    }
}

/// A capability the model can invoke by name.
///
/// Implementations receive the arguments untouched (no schema validation
/// happens) and a shared `RunContext`. They must not change agent
/// configuration or run variables; changes are requested through
/// `ToolEmission::Command` and `ToolEmission::SetState`.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema describing the arguments, forwarded to the model as-is.
    fn argument_schema(&self) -> Value;

    fn kind(&self) -> ToolKind {
        ToolKind::Function
    }

    /// Run the tool.
    ///
    /// An `Err` is not fatal: it is reported back to the model as a
    /// `ToolResult` carrying the error message.
    fn invoke(&self, arguments: &Value, ctx: &RunContext) -> Result<ToolOutcome, ToolError>;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            argument_schema: self.argument_schema(),
        }
    }
}

/// An append-only observer of emitted events.
///
/// Sinks see every event, including those of nested runners that never reach
/// the top-level caller's stream. A failed write fails the turn that emitted
/// the event.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &Event) -> AgenticResult<()>;

    /// Called once when a turn reaches `Finished` or `Failed`.
    fn seal(&self, agent_id: &AgentId, turn_id: &TurnId) -> AgenticResult<()>;
}

/// Shared, keyed storage for memory blocks.
///
/// Ids are generated by the store so that concurrent `put`s from sibling tool
/// calls cannot collide.
pub trait MemoryStore: Send + Sync {
    fn put(&self, owner: &AgentId, run: &RunId, content: String) -> AgenticResult<BlockId>;

    fn get(&self, block_id: &BlockId) -> AgenticResult<MemoryBlock>;

    fn release(&self, block_id: &BlockId) -> AgenticResult<()>;

    /// Drop every block belonging to `run`. Returns how many were released.
    fn release_run(&self, run: &RunId) -> AgenticResult<usize>;
}
