//! In-memory implementation of `EventSink`.
//!
//! `InMemoryEventLog` chains every event it receives, from every runner of
//! every depth, into one SHA-256 hash chain. Use `export_log()` to take a
//! snapshot and `verify_integrity()` to confirm nothing was altered.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info};

use agentic_contracts::{
    error::{AgenticError, AgenticResult},
    event::Event,
    ids::{AgentId, TurnId},
};
use agentic_core::traits::EventSink;

use crate::{
    chain::{find_break, hash_entry, verify_chain},
    entry::{AuditEntry, AuditLog, SealedTurn},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct LogState {
    pub(crate) entries: Vec<AuditEntry>,

    /// The `this_hash` of the last entry, or `GENESIS_HASH`.
    pub(crate) last_hash: String,

    pub(crate) sealed: Vec<SealedTurn>,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An append-only event log backed by a SHA-256 hash chain.
///
/// Cheap to share: runners on several threads may record into the same log
/// through an `Arc`.
pub struct InMemoryEventLog {
    log_id: String,
    pub(crate) state: Arc<Mutex<LogState>>,
}

impl InMemoryEventLog {
    pub fn new(log_id: impl Into<String>) -> Self {
        Self {
            log_id: log_id.into(),
            state: Arc::new(Mutex::new(LogState {
                entries: Vec::new(),
                last_hash: AuditEntry::GENESIS_HASH.to_string(),
                sealed: Vec::new(),
            })),
        }
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    fn lock(&self) -> AgenticResult<MutexGuard<'_, LogState>> {
        self.state.lock().map_err(|e| AgenticError::SinkWriteFailed {
            reason: format!("event log lock poisoned: {}", e),
        })
    }

    /// Read access that tolerates a poisoned lock; the chain itself tells
    /// whether the data is trustworthy.
    fn read(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The recorded events, in chain order.
    pub fn events(&self) -> Vec<Event> {
        self.read().entries.iter().map(|e| e.event.clone()).collect()
    }

    pub fn sealed_turns(&self) -> Vec<SealedTurn> {
        self.read().sealed.clone()
    }

    pub fn export_log(&self) -> AuditLog {
        let state = self.read();
        let terminal_hash = state
            .entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        AuditLog {
            log_id: self.log_id.clone(),
            entries: state.entries.clone(),
            sealed_turns: state.sealed.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.read().entries)
    }

    /// Chain sequence of the first tampered entry, if any.
    pub fn first_break(&self) -> Option<u64> {
        find_break(&self.read().entries)
    }
}

// ── EventSink impl ────────────────────────────────────────────────────────────

impl EventSink for InMemoryEventLog {
    fn record(&self, event: &Event) -> AgenticResult<()> {
        let mut state = self.lock()?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.entries.len() as u64;
        let this_hash = hash_entry(&self.log_id, sequence, event, &prev_hash)?;

        debug!(
            log_id = %self.log_id,
            sequence,
            kind = %event.kind,
            agent_id = %event.source_agent_id,
            "event chained"
        );

        state.entries.push(AuditEntry {
            sequence,
            log_id: self.log_id.clone(),
            event: event.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        Ok(())
    }

    fn seal(&self, agent_id: &AgentId, turn_id: &TurnId) -> AgenticResult<()> {
        let mut state = self.lock()?;

        let event_count = state
            .entries
            .iter()
            .filter(|e| &e.event.turn_id == turn_id)
            .count();
        let terminal_hash = state.last_hash.clone();

        info!(
            log_id = %self.log_id,
            agent_id = %agent_id,
            turn_id = %turn_id,
            event_count,
            terminal_hash = %terminal_hash,
            "turn sealed"
        );

        state.sealed.push(SealedTurn {
            agent_id: agent_id.clone(),
            turn_id: *turn_id,
            event_count,
            terminal_hash,
            sealed_at: Utc::now(),
        });

        Ok(())
    }
}
