//! Command handler modules for dlv-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod feed;
pub mod orders;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dlv_config::DashboardConfig;
use dlv_feed::HttpTransport;
use dlv_usecase::Envelope;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Defaults, then `--config` layers in order, then the environment.
pub fn resolve_config(config_paths: &[String]) -> Result<DashboardConfig> {
    if config_paths.is_empty() {
        return DashboardConfig::from_env();
    }
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = dlv_config::load_layered_yaml(&path_refs)?;
    tracing::debug!(config_hash = %loaded.config_hash, "layered config loaded");
    loaded.resolve()
}

pub fn transport(cfg: &DashboardConfig) -> Result<Arc<HttpTransport>> {
    let t = HttpTransport::new(Duration::from_secs(cfg.request_timeout_secs))
        .context("http transport init failed")?;
    Ok(Arc::new(t))
}

/// Print the envelope as JSON on stdout; a failed envelope also fails the
/// command so scripts see a non-zero exit.
pub fn emit<T: Serialize>(what: &str, env: &Envelope<T>) -> Result<()> {
    let out = serde_json::to_string_pretty(env).context("envelope encode failed")?;
    println!("{out}");
    if let Some(err) = env.error() {
        anyhow::bail!("{what} failed: {err}");
    }
    Ok(())
}
