//! CLI command implementations.

pub mod block;
pub mod height;
pub mod reconcile;
pub mod serve;

use zavax_resolver::RpcClient;

use crate::config::Settings;
use crate::output;

/// Build the RPC client, reporting failures the same way for every command.
pub(crate) fn client(settings: &Settings) -> Option<RpcClient> {
    match RpcClient::with_options(settings.rpc_options()) {
        Ok(c) => Some(c),
        Err(e) => {
            output::error(&format!("Failed to create RPC client: {}", e));
            None
        }
    }
}

/// Resolve `--node` against the config, reporting a missing node.
pub(crate) fn node(settings: &Settings, flag: Option<String>) -> Option<String> {
    match settings.node(flag) {
        Ok(n) => Some(n),
        Err(e) => {
            output::error(&e.to_string());
            output::hint("Example: zavax height --node https://10.0.0.5:9650/ext/bc/<chain-id>/rpc");
            None
        }
    }
}
