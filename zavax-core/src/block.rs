//! Read-only block view.
//!
//! A `Block` is decoded from the `result` payload of a `getBlock` or
//! `getBlockByHeight` reply. It is a snapshot of one chain element as the
//! node saw it at query time and is never merged with another poll.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque block identifier as rendered by the node (CB58 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(String);

impl BlockHash {
    /// Wrap a node-rendered block identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as the node rendered it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockHash {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One chain element as seen through the node's RPC surface.
///
/// # Height
///
/// The oracle subnet mirrors an external chain, so a reply carries two
/// heights: the subnet's own `result.height` and the mirrored block's
/// `result.data.height`. Resolution targets the mirrored height, so
/// `data.height` wins whenever it is present.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use zavax_core::Block;
///
/// let block = Block::from_payload(&json!({
///     "height": "12",
///     "id": "B12",
///     "parentID": "B11",
///     "data": { "height": 2400100 }
/// })).unwrap();
///
/// assert_eq!(block.height(), 2400100);
/// assert_eq!(block.id().as_str(), "B12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    height: u64,
    id: BlockHash,
    #[serde(rename = "parentID", skip_serializing_if = "Option::is_none")]
    parent_id: Option<BlockHash>,
}

impl Block {
    /// Create a block view directly.
    pub fn new(height: u64, id: impl Into<BlockHash>, parent_id: Option<BlockHash>) -> Self {
        Self {
            height,
            id: id.into(),
            parent_id,
        }
    }

    /// Decode a block from a success payload.
    ///
    /// Returns `None` when the payload is null, not an object, or has no
    /// readable height or id. That is how an absent head is represented.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let obj = payload.as_object()?;

        let height = obj
            .get("data")
            .and_then(|data| data.get("height"))
            .and_then(parse_height)
            .or_else(|| obj.get("height").and_then(parse_height))?;

        let id = obj.get("id").and_then(non_empty_str).map(BlockHash::new)?;

        let parent_id = obj
            .get("parentID")
            .and_then(non_empty_str)
            .map(BlockHash::new);

        Some(Self {
            height,
            id,
            parent_id,
        })
    }

    /// Height used for resolution.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// This block's identifier.
    pub fn id(&self) -> &BlockHash {
        &self.id
    }

    /// Parent identifier, if the node reported one.
    pub fn parent_id(&self) -> Option<&BlockHash> {
        self.parent_id.as_ref()
    }
}

/// Read a height that the node may encode as a number or a decimal string.
///
/// The subnet serialises 64-bit integers as JSON strings while the mirrored
/// block data uses plain numbers; both are accepted.
pub fn parse_height(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}
