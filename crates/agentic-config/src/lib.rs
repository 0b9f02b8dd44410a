//! # agentic-config
//!
//! TOML-driven agent tree configuration for the agentic turn scheduler.
//!
//! ## Overview
//!
//! An [`AgentTreeConfig`] describes a tree of agents: each entry names its
//! model, the catalog tools it uses, the human-input tools to create for it
//! and the agents placed under it. [`AgentTreeConfig::install`] validates
//! the document and registers the whole tree in an `AgentRegistry`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use agentic_config::{AgentTreeConfig, ToolCatalog};
//!
//! let config = AgentTreeConfig::from_file(Path::new("agents/news.toml"))?;
//! let registry = AgentRegistry::new();
//! let tree = config.install(&registry, &ToolCatalog::with_builtins())?;
//! // Build an Engine around `registry` and run `tree.root`.
//! ```

pub mod catalog;
pub mod loader;
pub mod schema;

pub use catalog::ToolCatalog;
pub use loader::InstalledTree;
pub use schema::{AgentSpec, AgentTreeConfig, RunnerSettings};

// ── Tests ─────────────────────────────────────────────────────────────────────
