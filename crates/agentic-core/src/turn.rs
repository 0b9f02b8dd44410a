//! Turn bookkeeping: the event log, the pending tool batch and the
//! serializable checkpoint of a runner.
//!
//! A parked turn is nothing but this data. Resuming it is a function of the
//! data and the caller's input; no call stack is kept alive.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use agentic_contracts::{
    error::{AgenticError, AgenticResult},
    event::Event,
    ids::{AgentId, CallId, RunId, TurnId},
    model::TurnUsage,
    state::TurnState,
};

use crate::runner::AgentRunner;

/// Append-only log of one turn, plus the read cursor of `next()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnLog {
    pub(crate) turn_id: TurnId,
    pub(crate) events: Vec<Event>,
    pub(crate) cursor: usize,
}

impl TurnLog {
    pub(crate) fn open(turn_id: TurnId) -> Self {
        Self {
            turn_id,
            events: Vec::new(),
            cursor: 0,
        }
    }

    /// Sequence numbers are positions, so they start at 1 and never skip.
    pub(crate) fn next_sequence(&self) -> u64 {
        self.events.len() as u64 + 1
    }

    pub(crate) fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// The next event the caller has not seen, skipping the ones the caller
    /// supplied itself.
    pub(crate) fn next_visible(&mut self) -> Option<Event> {
        while let Some(event) = self.events.get(self.cursor) {
            self.cursor += 1;
            if !event.kind.is_caller_originated() {
                return Some(event.clone());
            }
        }
        None
    }
}

/// One tool call of a batch, as requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCall {
    pub call_id: CallId,
    pub tool: String,
    pub arguments: Value,
}

pub(crate) enum Waiting {
    /// The call itself is an interrupt.
    Human {
        prompt: String,
        remember: Option<String>,
    },
    /// A child agent down the call stack is parked.
    Child(Box<AgentRunner>),
}

pub(crate) struct SuspendedCall {
    pub(crate) call: PendingCall,
    pub(crate) waiting: Waiting,
}

/// The tool calls of one model step.
///
/// Calls are dispatched one per scheduler step, in order. Suspended calls
/// queue up and are surfaced to the caller one at a time once every call has
/// been dispatched.
pub(crate) struct ToolBatch {
    pub(crate) calls: Vec<PendingCall>,
    pub(crate) dispatched: usize,
    pub(crate) suspended: VecDeque<SuspendedCall>,
}

impl ToolBatch {
    pub(crate) fn new(calls: Vec<PendingCall>) -> Self {
        Self {
            calls,
            dispatched: 0,
            suspended: VecDeque::new(),
        }
    }

    pub(crate) fn take_next(&mut self) -> Option<PendingCall> {
        let call = self.calls.get(self.dispatched).cloned()?;
        self.dispatched += 1;
        Some(call)
    }

    /// Calls with no `ToolResult` yet: the suspended ones, then the ones
    /// never dispatched.
    pub(crate) fn unanswered(&self) -> Vec<PendingCall> {
        self.suspended
            .iter()
            .map(|s| s.call.clone())
            .chain(self.calls.iter().skip(self.dispatched).cloned())
            .collect()
    }
}

/// Serializable form of a runner, including any parked descendants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerCheckpoint {
    pub agent_id: AgentId,
    pub run_id: RunId,
    pub user_id: String,
    pub depth: u32,
    pub state: TurnState,
    pub log: TurnLog,
    pub conversation: Vec<Event>,
    pub batch: Option<BatchCheckpoint>,
    pub final_output: Option<String>,
    pub failure: Option<AgenticError>,
    /// Run variables. Nested checkpoints repeat them; restore shares the
    /// top-level copy.
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    #[serde(default)]
    pub usage: TurnUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCheckpoint {
    pub calls: Vec<PendingCall>,
    pub dispatched: usize,
    pub suspended: Vec<SuspendedCheckpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspendedCheckpoint {
    pub call: PendingCall,
    pub waiting: WaitingCheckpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitingCheckpoint {
    Human {
        prompt: String,
        #[serde(default)]
        remember: Option<String>,
    },
    Child { runner: Box<RunnerCheckpoint> },
}

impl RunnerCheckpoint {
    pub fn to_json(&self) -> AgenticResult<String> {
        serde_json::to_string(self).map_err(|e| AgenticError::Checkpoint {
            reason: format!("failed to serialize checkpoint: {}", e),
        })
    }

    pub fn from_json(s: &str) -> AgenticResult<Self> {
        serde_json::from_str(s).map_err(|e| AgenticError::Checkpoint {
            reason: format!("failed to parse checkpoint: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use agentic_contracts::event::{payload, EventKind};

    use super::*;

    fn event(kind: EventKind, seq: u64, turn_id: TurnId) -> Event {
        Event {
            kind,
            payload: payload::text("x"),
            depth: 0,
            source_agent_id: AgentId::new("a"),
            turn_id,
            sequence_no: seq,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn next_visible_skips_caller_events_and_advances_cursor() {
        let turn_id = TurnId::new();
        let mut log = TurnLog::open(turn_id);
        log.push(event(EventKind::UserInput, 1, turn_id));
        log.push(event(EventKind::ModelOutputChunk, 2, turn_id));
        log.push(event(EventKind::InterruptResponse, 3, turn_id));
        log.push(event(EventKind::TurnComplete, 4, turn_id));

        assert_eq!(log.next_sequence(), 5);
        assert_eq!(log.next_visible().map(|e| e.kind), Some(EventKind::ModelOutputChunk));
        assert_eq!(log.next_visible().map(|e| e.kind), Some(EventKind::TurnComplete));
        assert_eq!(log.next_visible(), None);
        assert_eq!(log.next_visible(), None);
    }

    #[test]
    fn batch_hands_out_each_call_once() {
        let calls = vec![
            PendingCall {
                call_id: CallId::new(),
                tool: "a".to_string(),
                arguments: json!({}),
            },
            PendingCall {
                call_id: CallId::new(),
                tool: "b".to_string(),
                arguments: json!({}),
            },
        ];
        let mut batch = ToolBatch::new(calls);
        assert_eq!(batch.take_next().map(|c| c.tool), Some("a".to_string()));
        assert_eq!(batch.take_next().map(|c| c.tool), Some("b".to_string()));
        assert!(batch.take_next().is_none());
        assert_eq!(batch.dispatched, 2);
    }

    #[test]
    fn unanswered_lists_suspended_then_undispatched_calls() {
        let call = |tool: &str| PendingCall {
            call_id: CallId::new(),
            tool: tool.to_string(),
            arguments: json!({}),
        };
        let mut batch = ToolBatch::new(vec![call("done"), call("ask"), call("later")]);
        batch.take_next();
        let asked = batch.take_next().unwrap();
        batch.suspended.push_back(SuspendedCall {
            call: asked,
            waiting: Waiting::Human {
                prompt: "?".to_string(),
                remember: None,
            },
        });

        let tools: Vec<String> = batch.unanswered().into_iter().map(|c| c.tool).collect();
        assert_eq!(tools, vec!["ask", "later"]);
    }

    #[test]
    fn checkpoint_json_errors_map_to_checkpoint_error() {
        match RunnerCheckpoint::from_json("{ not json") {
            Err(AgenticError::Checkpoint { reason }) => assert!(reason.contains("parse")),
            other => panic!("expected Checkpoint error, got {:?}", other),
        }
    }
}
