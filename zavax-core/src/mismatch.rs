//! Reconciliation mismatch set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::parse_height;
use crate::error::{Result, ZavaxError};

/// Heights the node reported as disagreeing between its two chain views.
///
/// Order is the node's order. An empty set means full agreement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchSet {
    height: Vec<u64>,
}

impl MismatchSet {
    /// Wrap a list of mismatched heights.
    pub fn new(heights: Vec<u64>) -> Self {
        Self { height: heights }
    }

    /// Decode the `reconcileBlocks` success payload.
    ///
    /// The list lives in `result.height`; a null payload or a missing/null
    /// `height` means the node found nothing to report.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeight` if `height` is not a list of unsigned integers.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let heights = match payload.get("height") {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(ZavaxError::InvalidHeight(other.to_string())),
        };

        heights
            .iter()
            .map(|h| parse_height(h).ok_or_else(|| ZavaxError::InvalidHeight(h.to_string())))
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    /// Whether both views agree.
    pub fn is_agreement(&self) -> bool {
        self.height.is_empty()
    }

    /// Mismatched heights in node order.
    pub fn heights(&self) -> &[u64] {
        &self.height
    }

    /// Number of mismatched heights.
    pub fn len(&self) -> usize {
        self.height.len()
    }

    /// Same as [`MismatchSet::is_agreement`].
    pub fn is_empty(&self) -> bool {
        self.height.is_empty()
    }
}

/// Report of one reconciliation pass against a node.
///
/// Serialises as `{ "node", "agreement", "height": [..] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Node the check ran against.
    pub node: String,
    /// Whether both chain views agree.
    pub agreement: bool,
    /// Mismatched heights in node order.
    pub height: Vec<u64>,
}

impl Reconciliation {
    pub fn new(node: impl Into<String>, mismatches: &MismatchSet) -> Self {
        Self {
            node: node.into(),
            agreement: mismatches.is_agreement(),
            height: mismatches.heights().to_vec(),
        }
    }
}
