//! Reconciliation checker.
//!
//! One-shot: asks the node to compare its two chain views and hands back
//! the mismatched heights. There is no retry loop, so dropping the future
//! aborts the check.

use tracing::{info, warn};
use zavax_core::{MismatchSet, RpcResult};

use crate::error::{ResolverError, Result};
use crate::rpc::{NodeRpc, RpcClient};

/// Runs `reconcileBlocks` against a node.
pub struct ReconciliationChecker<R: NodeRpc = RpcClient> {
    rpc: R,
}

impl<R: NodeRpc> ReconciliationChecker<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }

    /// Request a reconciliation pass on `endpoint`.
    ///
    /// An empty set means both views agree.
    ///
    /// # Errors
    ///
    /// - `Node` if the node answered with an in-band error
    /// - `MalformedReply` if the mismatch list is not a list of heights
    /// - any transport error from the RPC client
    pub async fn reconcile(&self, endpoint: &str) -> Result<MismatchSet> {
        let payload = match self.rpc.reconcile_blocks(endpoint).await? {
            RpcResult::Success { payload } => payload,
            RpcResult::RpcError(err) => {
                warn!(endpoint, error = %err, "reconciliation rejected by node");
                return Err(ResolverError::Node(err));
            }
        };

        let mismatches = MismatchSet::from_payload(&payload)?;
        info!(
            endpoint,
            mismatches = mismatches.len(),
            agreement = mismatches.is_agreement(),
            "reconciliation finished"
        );
        Ok(mismatches)
    }
}
