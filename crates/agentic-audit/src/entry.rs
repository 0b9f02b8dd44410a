//! Chain entry and exported log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentic_contracts::{
    event::Event,
    ids::{AgentId, TurnId},
};

/// One event wrapped into the hash chain.
///
/// Modifying any field, including the embedded event, invalidates
/// `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the chain, starting at 0. Independent of the event's own
    /// per-turn `sequence_no`.
    pub sequence: u64,

    pub log_id: String,

    pub event: Event,

    /// Hash of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    pub this_hash: String,
}

impl AuditEntry {
    /// The `prev_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A turn that reached `Finished` or `Failed`, with the chain head at the
/// time it was sealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedTurn {
    pub agent_id: AgentId,
    pub turn_id: TurnId,
    pub event_count: usize,
    pub terminal_hash: String,
    pub sealed_at: DateTime<Utc>,
}

/// Snapshot of a whole event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub log_id: String,

    /// All entries in chain order.
    pub entries: Vec<AuditEntry>,

    pub sealed_turns: Vec<SealedTurn>,

    pub exported_at: DateTime<Utc>,

    /// `this_hash` of the last entry; empty if the log is empty.
    pub terminal_hash: String,
}

impl AuditLog {
    /// Entries of one turn, in order.
    pub fn turn(&self, turn_id: &TurnId) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| &e.event.turn_id == turn_id)
            .collect()
    }
}
