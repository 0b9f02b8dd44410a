//! Error types for the agentic runtime.
//!
//! All fallible scheduler and registry operations return `AgenticResult<T>`.
//! Every variant belongs to one `ErrorCategory`, which decides how the
//! scheduler reacts: model and internal errors fail the turn, tool errors are
//! fed back to the model, protocol errors are returned to the caller at the
//! call site.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The unified error type for the agentic runtime.
///
/// Serializable so that a failed runner can still be checkpointed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AgenticError {
    /// The completion service failed or returned something unusable.
    #[error("model '{model_ref}' failed: {reason}")]
    ModelError { model_ref: String, reason: String },

    /// No model client is registered for the agent's model reference.
    #[error("no model client registered for '{model_ref}'")]
    UnknownModel { model_ref: String },

    /// A model call or tool call exceeded a deadline enforced by the client.
    #[error("{operation} timed out after {elapsed_ms} ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    /// A tool raised or returned a failure.
    #[error("tool '{tool}' failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    /// `start` was called while a turn is still in progress.
    #[error("runner is already running (state: {state})")]
    AlreadyRunning { state: String },

    /// `continue_with` was called while no interrupt is pending.
    #[error("runner is not awaiting input (state: {state})")]
    NotAwaitingInput { state: String },

    /// Adding the child would make an agent its own ancestor.
    #[error("adding '{child}' under '{parent}' would create a cycle")]
    Cycle { parent: String, child: String },

    /// The agent already sits under another parent.
    #[error("agent '{child}' already has parent '{parent}'")]
    AlreadyParented { child: String, parent: String },

    /// `remove_child` named an agent that is not a child of the parent.
    #[error("agent '{child}' is not a child of '{parent}'")]
    NotAChild { parent: String, child: String },

    /// A tool with this name already exists on the agent.
    #[error("agent '{agent}' already has a tool named '{tool}'")]
    DuplicateTool { agent: String, tool: String },

    #[error("agent '{agent}' is not registered")]
    UnknownAgent { agent: String },

    #[error("agent '{agent}' has no tool named '{tool}'")]
    UnknownTool { agent: String, tool: String },

    /// The tool was synthesized for a child agent; remove the child instead.
    #[error("tool '{tool}' on '{agent}' wraps a child agent; use remove_child")]
    ProtectedTool { agent: String, tool: String },

    #[error("memory block '{block_id}' does not exist")]
    UnknownBlock { block_id: String },

    /// The turn was cancelled by the caller or by a cancelled ancestor.
    #[error("turn cancelled: {reason}")]
    Cancelled { reason: String },

    /// The scheduler reached a state it should never be in.
    #[error("state machine error: {reason}")]
    StateMachine { reason: String },

    /// An event sink could not record an event.
    #[error("event sink write failed: {reason}")]
    SinkWriteFailed { reason: String },

    /// A configuration document is missing, malformed or inconsistent.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A checkpoint could not be taken or restored.
    #[error("checkpoint error: {reason}")]
    Checkpoint { reason: String },
}

/// How the scheduler treats an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Completion call failed; the turn fails and the caller may start again.
    Model,
    /// Tool failure; reported to the model as an observation.
    ToolExecution,
    /// Programmer error; returned synchronously at the call site.
    Protocol,
    /// Explicit cancellation.
    Cancelled,
    /// Runtime fault outside the agent's control.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Model => "model",
            ErrorCategory::ToolExecution => "tool_execution",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl AgenticError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AgenticError::ModelError { .. }
            | AgenticError::UnknownModel { .. }
            | AgenticError::Timeout { .. } => ErrorCategory::Model,
            AgenticError::ToolExecution { .. } => ErrorCategory::ToolExecution,
            AgenticError::AlreadyRunning { .. }
            | AgenticError::NotAwaitingInput { .. }
            | AgenticError::Cycle { .. }
            | AgenticError::AlreadyParented { .. }
            | AgenticError::NotAChild { .. }
            | AgenticError::DuplicateTool { .. }
            | AgenticError::UnknownAgent { .. }
            | AgenticError::UnknownTool { .. }
            | AgenticError::ProtectedTool { .. }
            | AgenticError::UnknownBlock { .. } => ErrorCategory::Protocol,
            AgenticError::Cancelled { .. } => ErrorCategory::Cancelled,
            AgenticError::StateMachine { .. }
            | AgenticError::SinkWriteFailed { .. }
            | AgenticError::Config { .. }
            | AgenticError::Checkpoint { .. } => ErrorCategory::Internal,
        }
    }

    pub fn is_protocol(&self) -> bool {
        self.category() == ErrorCategory::Protocol
    }
}

/// Convenience alias used throughout the agentic crates.
pub type AgenticResult<T> = Result<T, AgenticError>;
