//! Height command implementation.

use clap::Args;
use zavax_core::RpcResult;

use crate::config::Settings;
use crate::output;

/// Arguments for the height command.
#[derive(Args)]
pub struct HeightArgs {
    /// Node RPC endpoint (overrides `default_node`)
    #[arg(short, long)]
    pub node: Option<String>,

    /// Print the node's raw reply as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the height command.
pub async fn run(args: HeightArgs, settings: Settings) -> i32 {
    let Some(node) = super::node(&settings, args.node) else {
        return 1;
    };
    let Some(rpc) = super::client(&settings) else {
        return 1;
    };

    if !args.json {
        output::info(&format!("Fetching head from {}...", node));
    }

    let reply = match rpc.head_reply(&node).await {
        Ok(r) => r,
        Err(e) => {
            output::error(&format!("Node request failed: {}", e));
            return 1;
        }
    };

    if args.json {
        let rejected = reply.get("error").map_or(false, |e| !e.is_null());
        output::json(&reply);
        return if rejected { 1 } else { 0 };
    }

    let result = match RpcResult::from_reply(reply) {
        Ok(r) => r,
        Err(e) => {
            output::error(&format!("Node request failed: {}", e));
            return 1;
        }
    };

    match &result {
        RpcResult::RpcError(err) => {
            output::error(&err.to_string());
            1
        }
        RpcResult::Success { payload } => {
            output::head(payload, result.block().as_ref());
            0
        }
    }
}
