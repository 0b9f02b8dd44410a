//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. log_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the event

use sha2::{Digest, Sha256};

use agentic_contracts::{
    error::{AgenticError, AgenticResult},
    event::Event,
};

use crate::entry::AuditEntry;

/// Compute the SHA-256 hash of one chain entry.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_entry(
    log_id: &str,
    sequence: u64,
    event: &Event,
    prev_hash: &str,
) -> AgenticResult<String> {
    let event_json = serde_json::to_vec(event).map_err(|e| AgenticError::SinkWriteFailed {
        reason: format!("event could not be encoded for hashing: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(log_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&event_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Sequence of the first entry that breaks the chain, if any.
///
/// An entry breaks the chain when its `prev_hash` is not the previous
/// entry's `this_hash` (or `GENESIS_HASH` for the first one), when its
/// `this_hash` does not match the recomputed hash, or when its sequence is
/// out of place.
pub fn find_break(entries: &[AuditEntry]) -> Option<u64> {
    let mut expected_prev = AuditEntry::GENESIS_HASH.to_string();

    for (position, entry) in entries.iter().enumerate() {
        if entry.sequence != position as u64 || entry.prev_hash != expected_prev {
            return Some(entry.sequence);
        }
        match hash_entry(&entry.log_id, entry.sequence, &entry.event, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return Some(entry.sequence),
        }
        expected_prev = entry.this_hash.clone();
    }

    None
}

/// True when the whole chain is intact. An empty chain is valid.
pub fn verify_chain(entries: &[AuditEntry]) -> bool {
    find_break(entries).is_none()
}
