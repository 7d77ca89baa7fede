//! # ZavaX Resolver
//!
//! **Block resolution and reconciliation against ZavaX oracle subnet nodes**
//!
//! This crate polls a node until the block at a requested height becomes
//! available, following the chain backward through parent links when the
//! head moves past the target, and runs one-shot reconciliation checks.
//!
//! ## Features
//!
//! - **Bounded**: a fixed attempt budget (12 by default) with a pluggable delay policy
//! - **Reorg-aware**: walks parent ids instead of blindly re-polling the head
//! - **Honest outcomes**: node errors halt polling and are returned verbatim
//! - **Cancellable**: an optional stop signal ends polling at the next attempt boundary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zavax_resolver::{BlockResolver, ReconciliationChecker, RpcClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let node = "https://10.0.0.5:9650/ext/bc/zavax/rpc";
//!     let client = RpcClient::new()?;
//!
//!     let resolution = BlockResolver::new(client.clone()).resolve(node, 2400100).await?;
//!     println!("{:?} after {} attempts", resolution.outcome, resolution.attempts);
//!
//!     let mismatches = ReconciliationChecker::new(client).reconcile(node).await?;
//!     println!("agreement: {}", mismatches.is_agreement());
//!
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod error;
pub mod reconcile;
pub mod resolver;
pub mod rpc;

#[cfg(test)]
mod mock;

// Re-export main types for convenience
pub use backoff::{BackoffPolicy, ConstantBackoff, JitteredBackoff, NoBackoff};
pub use error::ResolverError;
pub use reconcile::ReconciliationChecker;
pub use resolver::{BlockResolver, Outcome, Resolution, ResolutionAttemptState, ResolverConfig};
pub use rpc::{NodeRpc, RpcClient, RpcOptions};
