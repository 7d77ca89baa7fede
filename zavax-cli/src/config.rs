//! Proxy and resolver configuration.
//!
//! Settings come from `~/.zavax/config.toml` when it exists, then CLI flags
//! override individual keys. Every key is optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use zavax_resolver::backoff::{BackoffPolicy, DEFAULT_RETRY_DELAY_MS, JITTER_PERCENT};
use zavax_resolver::resolver::DEFAULT_MAX_ATTEMPTS;
use zavax_resolver::rpc::{DEFAULT_NAMESPACE, DEFAULT_TIMEOUT_SECS};
use zavax_resolver::{ConstantBackoff, JitteredBackoff, ResolverConfig, RpcOptions};

/// Default proxy listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Config file name inside the `.zavax` directory.
const CONFIG_FILE: &str = "config.toml";

/// Loaded settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Proxy listen address.
    pub bind: String,
    /// RPC method namespace.
    pub namespace: String,
    /// Per-request timeout towards nodes.
    pub request_timeout_secs: u64,
    /// Resolver attempt budget.
    pub max_attempts: u32,
    /// Delay between resolver attempts.
    pub retry_delay_ms: u64,
    /// Add ±10% jitter to the retry delay.
    pub jitter: bool,
    /// Node used by one-shot commands when `--node` is omitted.
    pub default_node: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            jitter: false,
            default_node: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location.
    ///
    /// A missing default file yields defaults; an explicitly given path
    /// must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// RPC client options.
    pub fn rpc_options(&self) -> RpcOptions {
        RpcOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            namespace: self.namespace.clone(),
        }
    }

    /// Resolver tuning.
    pub fn resolver_config(&self) -> ResolverConfig {
        let delay = Duration::from_millis(self.retry_delay_ms);
        let backoff: Arc<dyn BackoffPolicy> = if self.jitter {
            Arc::new(JitteredBackoff::new(delay, JITTER_PERCENT))
        } else {
            Arc::new(ConstantBackoff::new(delay))
        };
        ResolverConfig {
            max_attempts: self.max_attempts,
            backoff,
        }
    }

    /// Pick the node for a one-shot command.
    pub fn node(&self, flag: Option<String>) -> Result<String> {
        flag.or_else(|| self.default_node.clone())
            .context("No node given: pass --node or set default_node in the config file")
    }
}

/// `~/.zavax/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".zavax").join(CONFIG_FILE))
}
