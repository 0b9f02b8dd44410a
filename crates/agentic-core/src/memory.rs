//! In-memory `MemoryStore` and the block-reading tool.
//!
//! Blocks live in a `HashMap` behind a `Mutex`. Ids are minted by the store,
//! so sibling tool calls storing blocks at the same time never collide.

use std::{
    collections::HashMap,
    str::FromStr,
    sync::Mutex,
};

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use agentic_contracts::{
    error::{AgenticError, AgenticResult},
    ids::{AgentId, BlockId, RunId},
    memory::MemoryBlock,
};

use crate::{
    tool::{FunctionTool, ToolError},
    traits::MemoryStore,
};

#[derive(Default)]
pub struct InMemoryStore {
    blocks: Mutex<HashMap<BlockId, MemoryBlock>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.blocks.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> AgenticResult<std::sync::MutexGuard<'_, HashMap<BlockId, MemoryBlock>>> {
        self.blocks.lock().map_err(|e| AgenticError::StateMachine {
            reason: format!("memory store lock poisoned: {}", e),
        })
    }
}

impl MemoryStore for InMemoryStore {
    fn put(&self, owner: &AgentId, run: &RunId, content: String) -> AgenticResult<BlockId> {
        let block_id = BlockId::new();
        let block = MemoryBlock {
            block_id,
            owner_agent_id: owner.clone(),
            run_id: *run,
            content,
            created_at: Utc::now(),
        };
        debug!(
            block_id = %block_id,
            owner = %owner,
            bytes = block.content.len(),
            "memory block stored"
        );
        self.lock()?.insert(block_id, block);
        Ok(block_id)
    }

    fn get(&self, block_id: &BlockId) -> AgenticResult<MemoryBlock> {
        self.lock()?
            .get(block_id)
            .cloned()
            .ok_or_else(|| AgenticError::UnknownBlock {
                block_id: block_id.to_string(),
            })
    }

    fn release(&self, block_id: &BlockId) -> AgenticResult<()> {
        self.lock()?
            .remove(block_id)
            .map(|_| ())
            .ok_or_else(|| AgenticError::UnknownBlock {
                block_id: block_id.to_string(),
            })
    }

    fn release_run(&self, run: &RunId) -> AgenticResult<usize> {
        let mut blocks = self.lock()?;
        let before = blocks.len();
        blocks.retain(|_, block| block.run_id != *run);
        Ok(before - blocks.len())
    }
}

/// Name of the tool returned by [`read_block_tool`].
pub const READ_BLOCK_TOOL: &str = "read_memory_block";

/// A tool that fetches a memory block's content by id.
///
/// Give it to agents that receive block ids from other agents' tool results.
pub fn read_block_tool() -> FunctionTool {
    FunctionTool::from_fn(
        READ_BLOCK_TOOL,
        "Fetch the content of a memory block by its id.",
        json!({
            "type": "object",
            "properties": { "block_id": { "type": "string" } },
            "required": ["block_id"]
        }),
        |args, ctx| {
            let raw = args
                .get("block_id")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::new("missing 'block_id' argument"))?;
            let uuid = uuid_from_str(raw)?;
            let block = ctx.fetch_block(&BlockId(uuid))?;
            Ok(Value::String(block.content))
        },
    )
}

fn uuid_from_str(raw: &str) -> Result<uuid::Uuid, ToolError> {
    uuid::Uuid::from_str(raw).map_err(|e| ToolError::new(format!("invalid block id '{}': {}", raw, e)))
}
