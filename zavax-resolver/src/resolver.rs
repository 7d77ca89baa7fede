//! Block height resolver — the main public API.
//!
//! Polls a node until the block at a target height shows up, the attempt
//! budget runs out, or the node answers with an error.
//!
//! # Cursor heuristic
//!
//! Each attempt fetches either the node's head or, when a backtrack cursor
//! is set, a specific block by id:
//!
//! - after a head fetch, if the head height rose past the previously seen
//!   head and is not the target, the cursor moves to the head's parent so
//!   the next attempt walks backward along the ancestry;
//! - after a backtrack fetch, the walk continues while the block is still
//!   above the target and resets to the head otherwise.
//!
//! When the first head is not the target, the same attempt also asks for the
//! target with `getBlockByHeight`. That lookup answers directly for a height
//! the node already holds and makes the node start mirroring a height it
//! does not hold yet. A miss leaves the head as the last observation.
//!
//! This follows a node that is actively extending the chain. It is a
//! heuristic: a reorg that shrinks the head height between two polls is
//! indistinguishable from a stalled head.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use zavax_core::{Block, BlockHash, RpcResult};

use crate::backoff::{BackoffPolicy, ConstantBackoff};
use crate::error::Result;
use crate::rpc::{NodeRpc, RpcClient};

/// Default attempt budget per resolve call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;

/// Resolver tuning.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Total fetch attempts, head check included.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub backoff: Arc<dyn BackoffPolicy>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Arc::new(ConstantBackoff::default()),
        }
    }
}

/// Terminal state of a resolve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A fetched block had exactly the target height.
    Found,
    /// The attempt budget ran out; the result is the last observation.
    Exhausted,
    /// The node answered with an in-band error; the result is that error.
    RpcErrorHalt,
    /// The caller raised the stop signal; the result is the last observation.
    Cancelled,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Found => "found",
            Outcome::Exhausted => "exhausted",
            Outcome::RpcErrorHalt => "rpc_error",
            Outcome::Cancelled => "cancelled",
        }
    }
}

/// What a resolve call ended with.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Terminal state.
    pub outcome: Outcome,
    /// The result to hand back to the caller unchanged.
    pub result: RpcResult,
    /// Fetch attempts spent.
    pub attempts: u32,
}

impl Resolution {
    /// Block view of the result, if it carries one.
    pub fn block(&self) -> Option<Block> {
        self.result.block()
    }
}

/// Per-call polling state, passed by value from one attempt to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttemptState {
    attempts_remaining: u32,
    last_known_head: Option<Block>,
    backtrack_cursor: Option<BlockHash>,
}

impl ResolutionAttemptState {
    pub fn new(budget: u32) -> Self {
        Self {
            attempts_remaining: budget,
            last_known_head: None,
            backtrack_cursor: None,
        }
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn last_known_head(&self) -> Option<&Block> {
        self.last_known_head.as_ref()
    }

    /// Block id the next attempt should fetch; `None` means the head.
    pub fn cursor(&self) -> Option<&BlockHash> {
        self.backtrack_cursor.as_ref()
    }

    /// Spend one attempt.
    pub fn spend(self) -> Self {
        Self {
            attempts_remaining: self.attempts_remaining.saturating_sub(1),
            ..self
        }
    }

    /// Fold in the result of a head fetch.
    pub fn after_head(self, head: Option<Block>, target: u64) -> Self {
        let Some(head) = head else {
            return Self {
                backtrack_cursor: None,
                ..self
            };
        };

        let advanced = self
            .last_known_head
            .as_ref()
            .map_or(false, |prev| head.height() > prev.height());

        let backtrack_cursor = if advanced && head.height() != target {
            head.parent_id().cloned()
        } else {
            None
        };

        Self {
            attempts_remaining: self.attempts_remaining,
            last_known_head: Some(head),
            backtrack_cursor,
        }
    }

    /// Fold in the result of a backtrack fetch.
    pub fn after_backtrack(self, block: Option<&Block>, target: u64) -> Self {
        let backtrack_cursor = match block {
            Some(b) if b.height() > target => b.parent_id().cloned(),
            _ => None,
        };
        Self {
            backtrack_cursor,
            ..self
        }
    }
}

/// Reorg-aware block height resolver.
///
/// # Example
///
/// ```rust,no_run
/// use zavax_resolver::{BlockResolver, Outcome, RpcClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = BlockResolver::new(RpcClient::new()?);
///     let resolution = resolver
///         .resolve("https://10.0.0.5:9650/ext/bc/zavax/rpc", 2400100)
///         .await?;
///
///     match resolution.outcome {
///         Outcome::Found => println!("found after {} attempts", resolution.attempts),
///         other => println!("stopped: {:?}", other),
///     }
///     Ok(())
/// }
/// ```
pub struct BlockResolver<R: NodeRpc = RpcClient> {
    rpc: R,
    config: ResolverConfig,
}

impl<R: NodeRpc> BlockResolver<R> {
    /// Resolver with the default budget (12 attempts, 2 s apart).
    pub fn new(rpc: R) -> Self {
        Self::with_config(rpc, ResolverConfig::default())
    }

    pub fn with_config(rpc: R, config: ResolverConfig) -> Self {
        Self { rpc, config }
    }

    /// Resolve the block at `target` on `endpoint`.
    ///
    /// # Errors
    ///
    /// Transport failures are returned as `Err` without retrying. In-band
    /// node errors and an exhausted budget are ordinary [`Resolution`]s.
    pub async fn resolve(&self, endpoint: &str, target: u64) -> Result<Resolution> {
        self.run(endpoint, target, None).await
    }

    /// Like [`BlockResolver::resolve`], but stops at the next attempt
    /// boundary once `stop` reads `true`.
    pub async fn resolve_with_cancel(
        &self,
        endpoint: &str,
        target: u64,
        stop: watch::Receiver<bool>,
    ) -> Result<Resolution> {
        self.run(endpoint, target, Some(stop)).await
    }

    async fn run(
        &self,
        endpoint: &str,
        target: u64,
        mut stop: Option<watch::Receiver<bool>>,
    ) -> Result<Resolution> {
        let mut state = ResolutionAttemptState::new(self.config.max_attempts);
        let mut last = RpcResult::empty();
        let mut attempts = 0u32;

        while state.attempts_remaining() > 0 {
            if attempts > 0 {
                let delay = self.config.backoff.delay(attempts);
                if pause(delay, stop.as_mut()).await {
                    return Ok(finish(Outcome::Cancelled, last, attempts, endpoint, target));
                }
            }
            if stop_raised(stop.as_ref()) {
                return Ok(finish(Outcome::Cancelled, last, attempts, endpoint, target));
            }

            attempts += 1;
            state = state.spend();

            let cursor = state.cursor().cloned();
            let result = self.rpc.get_block(endpoint, cursor.as_ref()).await?;
            if result.is_error() {
                return Ok(finish(Outcome::RpcErrorHalt, result, attempts, endpoint, target));
            }

            let block = result.block();
            debug!(
                endpoint,
                target,
                attempt = attempts,
                cursor = cursor.as_ref().map(BlockHash::as_str),
                height = block.as_ref().map(Block::height),
                "resolver attempt"
            );

            if block.as_ref().map(Block::height) == Some(target) {
                return Ok(finish(Outcome::Found, result, attempts, endpoint, target));
            }

            if cursor.is_some() {
                state = state.after_backtrack(block.as_ref(), target);
                last = result;
                continue;
            }

            state = state.after_head(block, target);
            last = result;

            // The node only mirrors a height once it is asked for it by
            // height, so the first miss also requests the target directly.
            if attempts == 1 {
                let direct = self.rpc.get_block_by_height(endpoint, target).await?;
                if direct.is_error() {
                    return Ok(finish(Outcome::RpcErrorHalt, direct, attempts, endpoint, target));
                }
                if direct.block().map(|b| b.height()) == Some(target) {
                    return Ok(finish(Outcome::Found, direct, attempts, endpoint, target));
                }
            }
        }

        Ok(finish(Outcome::Exhausted, last, attempts, endpoint, target))
    }
}

fn finish(outcome: Outcome, result: RpcResult, attempts: u32, endpoint: &str, target: u64) -> Resolution {
    match outcome {
        Outcome::RpcErrorHalt => warn!(
            endpoint,
            target,
            attempts,
            error = %result.node_error().map(ToString::to_string).unwrap_or_default(),
            "resolver halted on node error"
        ),
        _ => info!(endpoint, target, attempts, outcome = outcome.as_str(), "resolver finished"),
    }
    Resolution {
        outcome,
        result,
        attempts,
    }
}

fn stop_raised(stop: Option<&watch::Receiver<bool>>) -> bool {
    stop.map_or(false, |rx| *rx.borrow())
}

/// Sleep for `delay`; returns `true` if the stop signal was raised meanwhile.
///
/// A dropped sender means nobody can cancel any more, so the full delay runs.
async fn pause(delay: Duration, stop: Option<&mut watch::Receiver<bool>>) -> bool {
    let Some(rx) = stop else {
        tokio::time::sleep(delay).await;
        return false;
    };
    if *rx.borrow() {
        return true;
    }

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return *rx.borrow(),
            changed = rx.changed() => {
                if changed.is_err() {
                    (&mut sleep).await;
                    return false;
                }
                if *rx.borrow() {
                    return true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::NoBackoff;
    use crate::error::ResolverError;
    use crate::mock::{block_reply, pending_reply, CountingBackoff, ScriptedNode};
    use serde_json::json;

    const NODE: &str = "https://node.test/ext/bc/zavax/rpc";

    fn resolver(node: ScriptedNode, backoff: Arc<CountingBackoff>) -> BlockResolver<ScriptedNode> {
        BlockResolver::with_config(
            node,
            ResolverConfig {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                backoff,
            },
        )
    }

    #[tokio::test]
    async fn test_head_already_at_target() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(ScriptedNode::new(vec![block_reply(100, "B100", "B99")]), backoff.clone());

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::Found);
        assert_eq!(res.attempts, 1);
        assert_eq!(r.rpc.requests().len(), 1);
        assert_eq!(r.rpc.requests()[0].method, "zavax.getBlock");
        assert!(r.rpc.requests()[0].params.is_empty());
        assert_eq!(backoff.count(), 0);
    }

    #[tokio::test]
    async fn test_target_behind_head_uses_direct_lookup() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(
            ScriptedNode::new(vec![block_reply(120, "B120", "B119"), block_reply(100, "B100", "B99")]),
            backoff.clone(),
        );

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::Found);
        assert_eq!(res.attempts, 1);
        assert_eq!(backoff.count(), 0);
        let requests = r.rpc.requests();
        assert_eq!(requests[1].method, "zavax.getBlockByHeight");
        assert_eq!(requests[1].params["id"], json!(100));
        assert_eq!(res.block().unwrap().id().as_str(), "B100");
    }

    #[tokio::test]
    async fn test_stuck_head_exhausts_budget() {
        let backoff = Arc::new(CountingBackoff::default());
        let mut replies = vec![block_reply(90, "B90", "B89"), pending_reply()];
        replies.extend((0..11).map(|_| block_reply(90, "B90", "B89")));
        let r = resolver(ScriptedNode::new(replies), backoff.clone());

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::Exhausted);
        assert_eq!(res.attempts, 12);
        assert_eq!(backoff.count(), 11);
        // Last observation returned unchanged
        assert_eq!(res.block().unwrap().height(), 90);

        let requests = r.rpc.requests();
        assert_eq!(requests.len(), 13);
        assert_eq!(requests[1].method, "zavax.getBlockByHeight");
        assert_eq!(requests[1].params["id"], json!(100));
        assert!(requests
            .iter()
            .enumerate()
            .all(|(i, req)| i == 1 || (req.method == "zavax.getBlock" && req.params.is_empty())));
    }

    #[tokio::test]
    async fn test_rising_head_backtracks_to_parent() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(
            ScriptedNode::new(vec![
                block_reply(90, "B90", "P90"),
                pending_reply(),
                block_reply(95, "B95", "P95"),
                block_reply(94, "P95", "P94"),
            ]),
            backoff,
        );

        let _ = r.resolve(NODE, 100).await.unwrap();

        let requests = r.rpc.requests();
        assert!(requests[0].params.is_empty());
        assert_eq!(requests[1].method, "zavax.getBlockByHeight");
        assert!(requests[2].params.is_empty());
        assert_eq!(requests[3].method, "zavax.getBlock");
        assert_eq!(requests[3].params["id"], json!("P95"));
        // Walk fell below the target: back to the head
        assert!(requests[4].params.is_empty());
    }

    #[tokio::test]
    async fn test_backtrack_walks_down_to_target() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(
            ScriptedNode::new(vec![
                block_reply(98, "B98", "B97"),
                pending_reply(),
                block_reply(102, "B102", "B101"),
                block_reply(101, "B101", "B100"),
                block_reply(100, "B100", "B99"),
            ]),
            backoff.clone(),
        );

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::Found);
        assert_eq!(res.attempts, 4);
        assert_eq!(backoff.count(), 3);
        let requests = r.rpc.requests();
        assert_eq!(requests[3].params["id"], json!("B101"));
        assert_eq!(requests[4].params["id"], json!("B100"));
    }

    #[tokio::test]
    async fn test_rpc_error_halts_immediately() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(ScriptedNode::new(vec![json!({ "error": "unknown method" })]), backoff.clone());

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::RpcErrorHalt);
        assert_eq!(res.attempts, 1);
        assert_eq!(r.rpc.requests().len(), 1);
        assert_eq!(backoff.count(), 0);
        assert_eq!(res.result.to_reply()["error"], json!("unknown method"));
    }

    #[tokio::test]
    async fn test_rpc_error_mid_loop() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(
            ScriptedNode::new(vec![
                block_reply(90, "B90", "B89"),
                pending_reply(),
                block_reply(91, "B91", "B90"),
                json!({ "error": { "code": -32000, "message": "Couldn't find a block" } }),
            ]),
            backoff,
        );

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::RpcErrorHalt);
        assert_eq!(res.attempts, 3);
        assert_eq!(res.result.node_error().unwrap().code, -32000);
    }

    #[tokio::test]
    async fn test_absent_head_keeps_polling() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(ScriptedNode::new(vec![]), backoff.clone());

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::Exhausted);
        assert_eq!(res.attempts, 12);
        assert_eq!(res.result, RpcResult::empty());
        let requests = r.rpc.requests();
        assert_eq!(requests.len(), 13);
        assert!(requests.iter().skip(2).all(|req| req.params.is_empty()));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(
            ScriptedNode::new(vec![block_reply(90, "B90", "B89")]).then_fail(),
            backoff,
        );

        let err = r.resolve(NODE, 100).await.unwrap_err();

        assert!(matches!(err, ResolverError::Transport(_)));
        assert_eq!(r.rpc.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_stop_before_first_attempt() {
        let r = BlockResolver::with_config(
            ScriptedNode::new(vec![block_reply(100, "B100", "B99")]),
            ResolverConfig {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                backoff: Arc::new(NoBackoff),
            },
        );
        let (_tx, rx) = watch::channel(true);

        let res = r.resolve_with_cancel(NODE, 100, rx).await.unwrap();

        assert_eq!(res.outcome, Outcome::Cancelled);
        assert_eq!(res.attempts, 0);
        assert!(r.rpc.requests().is_empty());
    }

    #[tokio::test]
    async fn test_stop_interrupts_delay() {
        let r = BlockResolver::with_config(
            ScriptedNode::new(vec![block_reply(90, "B90", "B89")]),
            ResolverConfig {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                backoff: Arc::new(ConstantBackoff::new(Duration::from_secs(3600))),
            },
        );
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });

        let res = tokio::time::timeout(Duration::from_secs(5), r.resolve_with_cancel(NODE, 100, rx))
            .await
            .expect("stop signal should cut the delay short")
            .unwrap();

        assert_eq!(res.outcome, Outcome::Cancelled);
        assert_eq!(res.attempts, 1);
        assert_eq!(res.block().unwrap().height(), 90);
    }

    /// Mirrors nothing past height 90 until asked for a height directly.
    #[derive(Default)]
    struct IngestingNode {
        ingested: std::sync::atomic::AtomicBool,
        by_height_calls: std::sync::atomic::AtomicU32,
    }

    #[async_trait::async_trait]
    impl NodeRpc for IngestingNode {
        async fn call(&self, _endpoint: &str, request: &zavax_core::RpcRequest) -> Result<RpcResult> {
            use std::sync::atomic::Ordering;

            if request.method.ends_with("getBlockByHeight") {
                self.by_height_calls.fetch_add(1, Ordering::SeqCst);
                self.ingested.store(true, Ordering::SeqCst);
                return Ok(RpcResult::from_reply(pending_reply())?);
            }
            let reply = if self.ingested.load(Ordering::SeqCst) {
                block_reply(100, "B100", "B99")
            } else {
                block_reply(90, "B90", "B89")
            };
            Ok(RpcResult::from_reply(reply)?)
        }
    }

    #[tokio::test]
    async fn test_height_lookup_lets_node_catch_up() {
        let r = BlockResolver::with_config(
            IngestingNode::default(),
            ResolverConfig {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                backoff: Arc::new(NoBackoff),
            },
        );

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::Found);
        assert_eq!(res.attempts, 2);
        assert_eq!(r.rpc.by_height_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_height_lookup_error_halts() {
        let backoff = Arc::new(CountingBackoff::default());
        let r = resolver(
            ScriptedNode::new(vec![
                block_reply(90, "B90", "B89"),
                json!({ "error": { "code": -32000, "message": "zcash block not found" } }),
            ]),
            backoff.clone(),
        );

        let res = r.resolve(NODE, 100).await.unwrap();

        assert_eq!(res.outcome, Outcome::RpcErrorHalt);
        assert_eq!(res.attempts, 1);
        assert_eq!(backoff.count(), 0);
    }

    #[test]
    fn test_first_head_only_records() {
        let state = ResolutionAttemptState::new(12)
            .spend()
            .after_head(Some(Block::new(90, "B90", Some("P90".into()))), 100);
        assert!(state.cursor().is_none());
        assert_eq!(state.last_known_head().unwrap().height(), 90);
        assert_eq!(state.attempts_remaining(), 11);
    }

    #[test]
    fn test_null_head_keeps_previous_head() {
        let state = ResolutionAttemptState::new(12)
            .after_head(Some(Block::new(90, "B90", None)), 100)
            .after_head(None, 100);
        assert!(state.cursor().is_none());
        assert_eq!(state.last_known_head().unwrap().height(), 90);
    }

    #[test]
    fn test_repeated_head_resets_cursor() {
        let state = ResolutionAttemptState::new(12)
            .after_head(Some(Block::new(90, "B90", Some("P90".into()))), 100)
            .after_head(Some(Block::new(90, "B90", Some("P90".into()))), 100);
        assert!(state.cursor().is_none());
    }
}
