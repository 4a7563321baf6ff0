//! Room engine configuration

use crate::types::{DedupScope, VoteOrder};
use serde::{Deserialize, Serialize};

/// Settings that change observable queue behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    /// Whether the dedup key set is process-wide or scoped to each room
    pub dedup_scope: DedupScope,
    /// Direction of the vote-ranked queue
    pub vote_order: VoteOrder,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            dedup_scope: DedupScope::Shared,
            vote_order: VoteOrder::Descending,
        }
    }
}
