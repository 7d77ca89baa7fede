//! Terminal rendering for heads, resolutions and reconciliation reports.
//!
//! Status and results go to stdout, failures to stderr. `NO_COLOR` is
//! honoured by `colored`.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;

use zavax_core::{block::parse_height, Block, Reconciliation};
use zavax_resolver::{Outcome, Resolution};

/// Progress line.
pub fn info(msg: &str) {
    println!("{} {}", "::".cyan().bold(), msg);
}

/// Failure line on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

/// Usage suggestion under an error.
pub fn hint(msg: &str) {
    eprintln!("  {} {}", "hint:".dimmed(), msg.dimmed());
}

/// Pretty JSON on stdout.
pub fn json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => error(&format!("Failed to render output: {}", e)),
    }
}

fn field(label: &str, value: impl Display) {
    println!("  {} {}", format!("{:<18}", label).dimmed(), value);
}

fn parent_or_dash(block: &Block) -> String {
    block
        .parent_id()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn outcome_tag(outcome: Outcome) -> ColoredString {
    let tag = format!("[{}]", outcome.as_str());
    match outcome {
        Outcome::Found => tag.green().bold(),
        Outcome::Exhausted => tag.yellow().bold(),
        Outcome::RpcErrorHalt => tag.red().bold(),
        Outcome::Cancelled => tag.dimmed(),
    }
}

/// Startup banner for `zavax serve`.
pub fn proxy_banner(bind: &str, namespace: &str, attempts: u32, delay_ms: u64) {
    println!("{} ZavaX proxy listening on http://{}", "✓".green().bold(), bind);
    field("namespace", if namespace.is_empty() { "-" } else { namespace });
    field("attempts", attempts);
    field("retry delay", format!("{}ms", delay_ms));
}

/// Head block from a `getBlock` success payload.
pub fn head(payload: &Value, block: Option<&Block>) {
    let Some(block) = block else {
        println!("{} node reported no head block", "!".yellow().bold());
        return;
    };
    println!("\n{}", "Head".bold());
    // The subnet's own height, as the UI shows it
    if let Some(subnet) = payload.get("height").and_then(parse_height) {
        field("subnet height", subnet);
    }
    field("block height", block.height());
    field("block id", block.id());
    field("parent id", parent_or_dash(block));
    println!();
}

/// Final state of a resolve call.
pub fn resolution(resolution: &Resolution, target: u64, elapsed: Duration) {
    println!();
    let tag = outcome_tag(resolution.outcome);
    match resolution.outcome {
        Outcome::Found => {
            println!("{} Block {} found after {} attempt(s)", tag, target, resolution.attempts);
            if let Some(block) = resolution.block() {
                field("block id", block.id());
                field("parent id", parent_or_dash(&block));
            }
        }
        Outcome::Exhausted => {
            println!("{} Block {} not available after {} attempts", tag, target, resolution.attempts);
            match resolution.block() {
                Some(block) => field("last seen height", block.height()),
                None => field("last seen height", "-"),
            }
            println!("  {}", "The node may still be ingesting this block. Try again shortly.".dimmed());
        }
        Outcome::RpcErrorHalt => {
            let msg = resolution
                .result
                .node_error()
                .map(ToString::to_string)
                .unwrap_or_default();
            println!("{} Node rejected the request", tag);
            error(&msg);
        }
        Outcome::Cancelled => {
            println!("{} Cancelled after {} attempt(s)", tag, resolution.attempts);
        }
    }
    field("total time", format!("{:.2}s", elapsed.as_secs_f64()));
    println!();
}

/// Reconciliation report: agreement, or the disagreeing heights in node order.
pub fn reconciliation(report: &Reconciliation) {
    println!();
    if report.agreement {
        println!("{} Chain views agree on {}", "✓".green().bold(), report.node);
    } else {
        println!(
            "{} {} mismatched height(s) on {}",
            "✗".red().bold(),
            report.height.len(),
            report.node
        );
        for height in &report.height {
            println!("  {}", height.to_string().yellow());
        }
    }
    println!();
}
