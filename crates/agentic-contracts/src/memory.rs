//! Memory blocks: shared content referenced by id instead of inlined.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, BlockId, RunId};

/// A referenceable unit of shared content.
///
/// A tool that produces a large result stores it as a block and returns only
/// the `block_id`; the receiving agent fetches the content on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub block_id: BlockId,
    pub owner_agent_id: AgentId,
    /// The run the block lives in. Closing the run releases it.
    pub run_id: RunId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
