//! Admin protocol payload types

use serde::{Deserialize, Serialize};

/// One entry in the node's channel list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Channel id
    pub name: String,
    /// Resource URL reported by the node
    #[serde(default)]
    pub url: String,
}

/// Observed state of one channel on a node: the ledger height and the
/// hash chain tip. Read-through only; not owned by this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel id
    pub name: String,
    /// Current block height
    pub height: u64,
    /// Hash of the newest block, hex encoded
    #[serde(rename = "blockHash")]
    pub block_hash: String,
    /// Participation status as reported by the node
    #[serde(default)]
    pub status: String,
}

/// Selector for a single-block fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    /// By block number
    Number(u64),
    /// By block hash, hex encoded
    Hash(String),
    /// By id of a transaction the block contains
    Tx(String),
}

impl BlockRef {
    /// Path segment for this selector under `.../blocks/`
    pub(crate) fn path_segment(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Hash(h) => format!("hash/{h}"),
            Self::Tx(tx) => format!("tx/{tx}"),
        }
    }
}
