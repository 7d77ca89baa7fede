//! HTTP API served by `zavax serve`.

pub mod proxy;

pub use proxy::{serve, ProxyState};
