//! Block command implementation.

use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use zavax_resolver::{BlockResolver, ConstantBackoff, Outcome};

use crate::config::Settings;
use crate::output;

/// Arguments for the block command.
#[derive(Args)]
pub struct BlockArgs {
    /// Node RPC endpoint (overrides `default_node`)
    #[arg(short, long)]
    pub node: Option<String>,

    /// Mirrored chain height to resolve
    #[arg(long)]
    pub height: u64,

    /// Attempt budget (overrides `max_attempts`)
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Delay between attempts in milliseconds (overrides `retry_delay_ms`)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output structure.
#[derive(Serialize)]
struct JsonOutput {
    outcome: &'static str,
    target: u64,
    attempts: u32,
    time_ms: u64,
    reply: serde_json::Value,
}

/// Run the block command.
pub async fn run(args: BlockArgs, settings: Settings) -> i32 {
    let Some(node) = super::node(&settings, args.node) else {
        return 1;
    };
    let Some(rpc) = super::client(&settings) else {
        return 1;
    };

    let mut config = settings.resolver_config();
    if let Some(attempts) = args.attempts {
        if attempts == 0 {
            output::error("--attempts must be at least 1");
            return 1;
        }
        config.max_attempts = attempts;
    }
    if let Some(ms) = args.delay_ms {
        config.backoff = Arc::new(ConstantBackoff::new(Duration::from_millis(ms)));
    }

    if !args.json {
        output::info(&format!(
            "Resolving height {} on {} ({} attempts max)...",
            args.height, node, config.max_attempts
        ));
    }

    // Ctrl-C stops polling at the next attempt boundary
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    let start = Instant::now();
    let resolver = BlockResolver::with_config(rpc, config);
    let resolution = match resolver.resolve_with_cancel(&node, args.height, stop_rx).await {
        Ok(r) => r,
        Err(e) => {
            output::error(&format!("Node request failed: {}", e));
            return 1;
        }
    };
    let elapsed = start.elapsed();

    if args.json {
        let out = JsonOutput {
            outcome: resolution.outcome.as_str(),
            target: args.height,
            attempts: resolution.attempts,
            time_ms: elapsed.as_millis() as u64,
            reply: resolution.result.to_reply(),
        };
        output::json(&out);
    } else {
        output::resolution(&resolution, args.height, elapsed);
    }

    exit_code(resolution.outcome)
}

fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Found => 0,
        Outcome::RpcErrorHalt => 1,
        Outcome::Exhausted => 2,
        Outcome::Cancelled => 130,
    }
}
