//! JSON-RPC envelope codec.
//!
//! Every request to a node is wrapped in the same fixed envelope:
//!
//! ```text
//! { "jsonrpc": "2.0", "method": <string>, "params": <object>, "id": 1 }
//! ```
//!
//! Replies are decoded into [`RpcResult`]: a reply carrying a non-null
//! top-level `error` is an in-band node error, anything else is a success
//! whose payload is the `result` field (null when absent).

use serde_json::{json, Map, Value};

use crate::block::Block;
use crate::error::{Result, ZavaxError};

/// Protocol version tag sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request id sent with every request. Calls are one-shot, so it never varies.
pub const REQUEST_ID: u64 = 1;

/// Node methods used by the resolver and the reconciliation checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetch the head (no params) or a block by id (`{id}`).
    GetBlock,
    /// Fetch a block by mirrored height (`{id: <height>}`).
    GetBlockByHeight,
    /// Ask the node to compare its two chain views.
    ReconcileBlocks,
}

impl Method {
    /// Bare method name.
    pub fn name(&self) -> &'static str {
        match self {
            Method::GetBlock => "getBlock",
            Method::GetBlockByHeight => "getBlockByHeight",
            Method::ReconcileBlocks => "reconcileBlocks",
        }
    }

    /// Wire name under a service namespace (`zavax.getBlock`).
    ///
    /// An empty namespace yields the bare name.
    pub fn qualified(&self, namespace: &str) -> String {
        if namespace.is_empty() {
            self.name().to_string()
        } else {
            format!("{}.{}", namespace, self.name())
        }
    }
}

/// A single JSON-RPC request before it is wrapped in the envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Wire method name.
    pub method: String,
    /// Named parameters.
    pub params: Map<String, Value>,
}

impl RpcRequest {
    /// Create a request with no parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Map::new(),
        }
    }

    /// Add a named parameter.
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Wrap the request in the fixed protocol envelope.
    pub fn envelope(&self) -> Value {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": self.method,
            "params": self.params,
            "id": REQUEST_ID,
        })
    }
}

/// In-band error reported by a node.
///
/// Nodes are not consistent about the error shape: most send the JSON-RPC
/// `{code, message}` object, some send a bare string. The original value is
/// kept so it can be handed back to the caller untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeError {
    /// Error code (0 when the node did not send one).
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    raw: Value,
}

impl NodeError {
    /// Build a JSON-RPC style error.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        let raw = json!({ "code": code, "message": message });
        Self { code, message, raw }
    }

    /// Decode whatever the node put in its `error` field.
    pub fn from_value(raw: Value) -> Self {
        let (code, message) = match &raw {
            Value::Object(obj) => (
                obj.get("code").and_then(Value::as_i64).unwrap_or(0),
                obj.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| raw.to_string()),
            ),
            Value::String(s) => (0, s.clone()),
            other => (0, other.to_string()),
        };
        Self { code, message, raw }
    }

    /// The error exactly as the node sent it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node error {}: {}", self.code, self.message)
    }
}

/// Outcome of one JSON-RPC call that reached the node.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResult {
    /// Well-formed reply without an `error` field.
    Success {
        /// The reply's `result` field (null when absent).
        payload: Value,
    },
    /// Reply carrying an `error` field.
    RpcError(NodeError),
}

impl RpcResult {
    /// An empty observation: success with a null payload.
    pub fn empty() -> Self {
        RpcResult::Success {
            payload: Value::Null,
        }
    }

    /// Decode a reply body.
    ///
    /// # Errors
    ///
    /// Returns `MalformedReply` if the body is not a JSON object.
    pub fn from_reply(reply: Value) -> Result<Self> {
        let mut obj = match reply {
            Value::Object(obj) => obj,
            other => return Err(ZavaxError::MalformedReply(json_kind(&other).to_string())),
        };

        match obj.remove("error") {
            Some(error) if !error.is_null() => Ok(RpcResult::RpcError(NodeError::from_value(error))),
            _ => Ok(RpcResult::Success {
                payload: obj.remove("result").unwrap_or(Value::Null),
            }),
        }
    }

    /// Rebuild the node's reply envelope.
    pub fn to_reply(&self) -> Value {
        match self {
            RpcResult::Success { payload } => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": REQUEST_ID,
                "result": payload,
            }),
            RpcResult::RpcError(err) => json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": REQUEST_ID,
                "error": err.raw(),
            }),
        }
    }

    /// Success payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            RpcResult::Success { payload } => Some(payload),
            RpcResult::RpcError(_) => None,
        }
    }

    /// In-band error, if any.
    pub fn node_error(&self) -> Option<&NodeError> {
        match self {
            RpcResult::RpcError(err) => Some(err),
            RpcResult::Success { .. } => None,
        }
    }

    /// Whether the node answered with an error.
    pub fn is_error(&self) -> bool {
        matches!(self, RpcResult::RpcError(_))
    }

    /// Block view of a success payload.
    pub fn block(&self) -> Option<Block> {
        self.payload().and_then(Block::from_payload)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
