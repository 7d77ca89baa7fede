//! ZavaX Oracle CLI
//!
//! HTTP proxy for the oracle UI plus one-shot block and reconciliation queries.

mod api;
mod commands;
mod config;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zavax")]
#[command(version)]
#[command(about = "ZavaX Oracle - block resolution and reconciliation proxy", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: ~/.zavax/config.toml)
    #[arg(long, global = true, env = "ZAVAX_CONFIG")]
    config: Option<PathBuf>,

    /// RPC method namespace (empty for bare method names)
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP proxy for the UI
    Serve(commands::serve::ServeArgs),

    /// Show the current head of a node
    Height(commands::height::HeightArgs),

    /// Resolve the block at a height, polling until it appears
    Block(commands::block::BlockArgs),

    /// Ask a node to reconcile its chain views
    Reconcile(commands::reconcile::ReconcileArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let mut settings = match config::Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            output::error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };
    if let Some(namespace) = cli.namespace {
        settings.namespace = namespace;
    }

    let exit_code = match cli.command {
        Commands::Serve(args) => commands::serve::run(args, settings).await,
        Commands::Height(args) => commands::height::run(args, settings).await,
        Commands::Block(args) => commands::block::run(args, settings).await,
        Commands::Reconcile(args) => commands::reconcile::run(args, settings).await,
    };

    std::process::exit(exit_code);
}
