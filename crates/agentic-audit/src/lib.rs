//! # agentic-audit
//!
//! Append-only, SHA-256 hash-chained event log for the agentic turn
//! scheduler.
//!
//! ## Overview
//!
//! `InMemoryEventLog` is an `EventSink`: attach it to an `Engine` and it
//! records every event of every runner, nested ones included. Each event is
//! wrapped in an `AuditEntry` linked to the previous entry by hash, so
//! altering any recorded event is detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agentic_audit::InMemoryEventLog;
//!
//! let log = Arc::new(InMemoryEventLog::new("run-001"));
//! let engine = Engine::builder().agents(registry).sink(log.clone()).build();
//! // ... run turns ...
//! assert!(log.verify_integrity());
//! let exported = log.export_log();
//! ```

pub mod chain;
pub mod entry;
pub mod memory;

pub use chain::{find_break, hash_entry, verify_chain};
pub use entry::{AuditEntry, AuditLog, SealedTurn};
pub use memory::InMemoryEventLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
