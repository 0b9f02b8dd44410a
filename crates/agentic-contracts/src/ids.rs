//! Identifier types.
//!
//! Agents are addressed by a readable, registry-assigned `AgentId`. Runs,
//! turns, tool calls and memory blocks get random UUIDs so that ids generated
//! concurrently by sibling runners never collide.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of an agent inside an `AgentRegistry`.
///
/// Assigned at registration time from the agent's name, e.g.
/// `AgentId("news_reporter")`. Appears in every event the agent emits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! uuid_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            /// Create a new, random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    RunId,
    "Identifies one run: a top-level runner and every nested runner it spawns."
);
uuid_id!(TurnId, "Identifies a single turn of one agent runner.");
uuid_id!(CallId, "Identifies one tool call inside a batch.");
uuid_id!(BlockId, "Store-generated identifier of a memory block.");
