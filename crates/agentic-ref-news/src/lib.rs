//! # agentic-ref-news
//!
//! News-desk reference runtime for the agentic turn scheduler.
//!
//! Demonstrates the scheduler end to end with deterministic models and mock
//! data:
//!
//! 1. **Echo** – a single agent calls one tool and answers.
//! 2. **News Producer** – a producer asks the human for a topic, delegates
//!    to a reporter sub-agent and summarizes the headlines.
//! 3. **Profile Writer** – a researcher stores a profile as a memory block
//!    and hands only the block id to a writer sub-agent.
//! 4. **Configured Desk** – the news tree loaded from TOML through
//!    `agentic-config` and driven by a generic tool-walking model.
//!
//! All data is hardcoded and fictional. No external API calls are made.

pub mod mock_data;
pub mod models;
pub mod scenarios;
