//! Turn lifecycle states.
//!
//! ```text
//! Idle -> Running -> { AwaitingTool | AwaitingInput } -> Running -> ... -> Finished | Failed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// The execution state of one agent runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// No turn has been started yet.
    Idle,
    /// A model decision is due.
    Running,
    /// A tool batch is being dispatched.
    AwaitingTool,
    /// Parked until the caller calls `continue_with`.
    AwaitingInput,
    Finished,
    Failed,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Finished | TurnState::Failed)
    }

    /// A new turn may only be opened from these states.
    pub fn can_start(&self) -> bool {
        matches!(self, TurnState::Idle | TurnState::Finished | TurnState::Failed)
    }

    /// States in which `next()` still has work to drive.
    pub fn is_active(&self) -> bool {
        matches!(self, TurnState::Running | TurnState::AwaitingTool)
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnState::Idle => "idle",
            TurnState::Running => "running",
            TurnState::AwaitingTool => "awaiting_tool",
            TurnState::AwaitingInput => "awaiting_input",
            TurnState::Finished => "finished",
            TurnState::Failed => "failed",
        };
        f.write_str(s)
    }
}
