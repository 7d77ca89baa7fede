//! # ZavaX Core
//!
//! **Data model for the ZavaX oracle block resolver**
//!
//! This crate holds the plain values that travel between a ZavaX subnet node
//! and the resolver: the JSON-RPC envelope, the polymorphic RPC result, the
//! read-only block view and the reconciliation mismatch set.
//!
//! ## Features
//!
//! - **No I/O**: every type here is built from, or rendered to, `serde_json::Value`
//! - **Lenient decoding**: heights arrive as numbers or decimal strings
//! - **Passthrough**: in-band node errors keep the exact value the node sent
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use zavax_core::{Block, RpcResult};
//!
//! let reply = json!({
//!     "jsonrpc": "2.0",
//!     "id": 1,
//!     "result": { "height": "7", "id": "B7", "parentID": "B6", "data": { "height": 2400100 } }
//! });
//!
//! let result = RpcResult::from_reply(reply).unwrap();
//! let block = result.block().unwrap();
//! assert_eq!(block.height(), 2400100);
//! assert_eq!(block.parent_id().map(|p| p.as_str()), Some("B6"));
//! ```

pub mod block;
pub mod envelope;
pub mod error;
pub mod mismatch;

// Re-export main types for convenience
pub use block::{Block, BlockHash};
pub use envelope::{Method, NodeError, RpcRequest, RpcResult, JSONRPC_VERSION, REQUEST_ID};
pub use error::ZavaxError;
pub use mismatch::{MismatchSet, Reconciliation};
