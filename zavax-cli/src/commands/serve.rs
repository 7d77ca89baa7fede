//! Serve command implementation.

use clap::Args;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, ProxyState};
use crate::config::Settings;
use crate::output;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Listen address (overrides `bind` in the config file)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, settings: Settings) -> i32 {
    let Some(rpc) = super::client(&settings) else {
        return 1;
    };

    let bind = args.bind.unwrap_or_else(|| settings.bind.clone());
    let listener = match TcpListener::bind(&bind).await {
        Ok(l) => l,
        Err(e) => {
            output::error(&format!("Failed to bind to {}: {}", bind, e));
            return 1;
        }
    };

    let state = Arc::new(ProxyState {
        rpc,
        resolver: settings.resolver_config(),
    });

    output::proxy_banner(&bind, &settings.namespace, settings.max_attempts, settings.retry_delay_ms);

    match api::serve(listener, state, shutdown_signal()).await {
        Ok(()) => {
            info!("ZavaX proxy stopped");
            0
        }
        Err(e) => {
            output::error(&format!("Proxy error: {}", e));
            1
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler: run until killed
        std::future::pending::<()>().await;
    }
}
