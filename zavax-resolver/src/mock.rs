//! Scripted node and backoff recorder for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use zavax_core::{RpcRequest, RpcResult};

use crate::backoff::BackoffPolicy;
use crate::error::{ResolverError, Result};
use crate::rpc::NodeRpc;

/// Replays canned replies in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedNode {
    replies: Mutex<VecDeque<Option<Value>>>,
    requests: Mutex<Vec<RpcRequest>>,
}

impl ScriptedNode {
    pub(crate) fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Some).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a transport failure.
    pub(crate) fn then_fail(self) -> Self {
        self.replies.lock().unwrap().push_back(None);
        self
    }

    pub(crate) fn requests(&self) -> Vec<RpcRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeRpc for ScriptedNode {
    async fn call(&self, _endpoint: &str, request: &RpcRequest) -> Result<RpcResult> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(RpcResult::from_reply(reply)?),
            Some(None) => Err(ResolverError::Transport("connection refused".to_string())),
            // Script ran dry: keep answering with an absent head
            None => Ok(RpcResult::empty()),
        }
    }
}

/// Counts delays without sleeping.
#[derive(Debug, Default)]
pub(crate) struct CountingBackoff {
    delays: AtomicU32,
}

impl CountingBackoff {
    pub(crate) fn count(&self) -> u32 {
        self.delays.load(Ordering::SeqCst)
    }
}

impl BackoffPolicy for CountingBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delays.fetch_add(1, Ordering::SeqCst);
        Duration::ZERO
    }
}

/// Reply envelope for a block.
pub(crate) fn block_reply(height: u64, id: &str, parent: &str) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "timestamp": "1700000000",
            "height": "1",
            "id": id,
            "parentID": parent,
            "data": { "height": height }
        }
    })
}

/// What the node answers to `getBlockByHeight` for a height it does not
/// hold yet: a zeroed reply with no id.
pub(crate) fn pending_reply() -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": { "timestamp": "0", "height": "0", "id": "", "parentID": "", "data": null }
    })
}
