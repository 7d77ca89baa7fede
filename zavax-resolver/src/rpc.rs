//! RPC client for talking to ZavaX subnet nodes.
//!
//! Wraps a shared `reqwest::Client` that sends one JSON-RPC envelope per
//! call. Nodes run behind internal, pinned deployments with self-signed
//! certificates, so certificate validation is switched off here.

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use zavax_core::{BlockHash, Method, RpcRequest, RpcResult};

use crate::error::{ResolverError, Result};

/// Service namespace the ZavaX VM registers its handlers under.
pub const DEFAULT_NAMESPACE: &str = "zavax";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A single-call JSON-RPC transport to a node.
///
/// The resolver and the reconciliation checker only depend on this trait,
/// so they can be driven by a scripted node in tests.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Send exactly one request to `endpoint`.
    ///
    /// In-band node errors come back as `Ok(RpcResult::RpcError)`; only
    /// transport problems are `Err`.
    async fn call(&self, endpoint: &str, request: &RpcRequest) -> Result<RpcResult>;

    /// Namespace prefixed to every method name.
    fn namespace(&self) -> &str {
        DEFAULT_NAMESPACE
    }

    /// `getBlock`: the head when `id` is `None`, otherwise the block with that id.
    async fn get_block(&self, endpoint: &str, id: Option<&BlockHash>) -> Result<RpcResult> {
        let mut request = RpcRequest::new(Method::GetBlock.qualified(self.namespace()));
        if let Some(id) = id {
            request = request.param("id", id.as_str());
        }
        self.call(endpoint, &request).await
    }

    /// `getBlockByHeight` for a mirrored chain height.
    async fn get_block_by_height(&self, endpoint: &str, height: u64) -> Result<RpcResult> {
        let request =
            RpcRequest::new(Method::GetBlockByHeight.qualified(self.namespace())).param("id", height);
        self.call(endpoint, &request).await
    }

    /// `reconcileBlocks`: ask the node to compare its chain views.
    async fn reconcile_blocks(&self, endpoint: &str) -> Result<RpcResult> {
        let request = RpcRequest::new(Method::ReconcileBlocks.qualified(self.namespace()));
        self.call(endpoint, &request).await
    }
}

/// Options for building an [`RpcClient`].
#[derive(Debug, Clone)]
pub struct RpcOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Method namespace (`zavax` on stock nodes).
    pub namespace: String,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// HTTP JSON-RPC client for ZavaX nodes.
///
/// Cheap to clone; clones share the underlying connection pool. The
/// endpoint is supplied per call, so one client serves any number of nodes.
///
/// # Example
///
/// ```rust,no_run
/// use zavax_resolver::{NodeRpc, RpcClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RpcClient::new()?;
///     let head = client.get_block("https://10.0.0.5:9650/ext/bc/zavax/rpc", None).await?;
///
///     if let Some(block) = head.block() {
///         println!("Head at height {}", block.height());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    namespace: String,
}

impl RpcClient {
    /// Create a client with default options.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_options(RpcOptions::default())
    }

    /// Create a client with explicit options.
    pub fn with_options(options: RpcOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ResolverError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            namespace: options.namespace,
        })
    }

    /// Send `request` and return the reply body exactly as the node sent it.
    ///
    /// # Errors
    ///
    /// Transport failures, and `MalformedReply` when the body is not JSON.
    pub async fn send(&self, endpoint: &str, request: &RpcRequest) -> Result<Value> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| ResolverError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        let started = Instant::now();
        let response = self
            .http
            .post(url)
            .json(&request.envelope())
            .send()
            .await
            .map_err(|e| {
                warn!(method = %request.method, endpoint, error = %e, "node request failed");
                ResolverError::from(e)
            })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            warn!(method = %request.method, endpoint, %status, error = %e, "unreadable node reply");
            ResolverError::MalformedReply(e.to_string())
        })?;

        debug!(
            method = %request.method,
            endpoint,
            %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "node call"
        );
        Ok(body)
    }

    /// Raw head reply, for callers that pass it on untouched.
    pub async fn head_reply(&self, endpoint: &str) -> Result<Value> {
        let request = RpcRequest::new(Method::GetBlock.qualified(&self.namespace));
        self.send(endpoint, &request).await
    }
}

#[async_trait]
impl NodeRpc for RpcClient {
    async fn call(&self, endpoint: &str, request: &RpcRequest) -> Result<RpcResult> {
        let body = self.send(endpoint, request).await?;
        Ok(RpcResult::from_reply(body)?)
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
