//! Reconcile command implementation.

use clap::Args;
use serde_json::json;

use zavax_core::Reconciliation;
use zavax_resolver::ReconciliationChecker;

use crate::config::Settings;
use crate::output;

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Node RPC endpoint (overrides `default_node`)
    #[arg(short, long)]
    pub node: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the reconcile command.
///
/// Exit code 0 on agreement, 2 when mismatches were reported, 1 on failure.
pub async fn run(args: ReconcileArgs, settings: Settings) -> i32 {
    let Some(node) = super::node(&settings, args.node) else {
        return 1;
    };
    let Some(rpc) = super::client(&settings) else {
        return 1;
    };

    if !args.json {
        output::info(&format!("Reconciling chain views on {}...", node));
    }

    let mismatches = match ReconciliationChecker::new(rpc).reconcile(&node).await {
        Ok(m) => m,
        Err(e) => {
            if args.json {
                output::json(&json!({ "success": false, "error": e.to_string() }));
            } else {
                output::error(&format!("Reconciliation failed: {}", e));
            }
            return 1;
        }
    };

    let report = Reconciliation::new(node, &mismatches);
    if args.json {
        output::json(&report);
    } else {
        output::reconciliation(&report);
    }

    if report.agreement {
        0
    } else {
        2
    }
}
