//! dlv-config
//!
//! Runtime configuration for the delivery dashboard: upstream base URLs, the
//! poll cadence and the daemon bind address.
//!
//! Resolution order, later wins:
//! 1. built-in defaults ([`DashboardConfig::default`])
//! 2. YAML documents merged in order ([`load_layered_yaml`])
//! 3. environment overrides ([`ENV_NOTIFICATION_HOST`] and friends)
//!
//! Callers resolve once at startup and pass the result into constructors;
//! nothing else in the workspace reads the environment.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

pub const ENV_NOTIFICATION_HOST: &str = "DLV_NOTIFICATION_API_HOST";
pub const ENV_ORDER_HOST: &str = "DLV_ORDER_API_HOST";
pub const ENV_POLL_INTERVAL_SECS: &str = "DLV_POLL_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "DLV_REQUEST_TIMEOUT_SECS";
pub const ENV_DAEMON_ADDR: &str = "DLV_DAEMON_ADDR";

pub const DEFAULT_NOTIFICATION_HOST: &str = "http://13.216.195.66";
pub const DEFAULT_ORDER_HOST: &str = "http://localhost:8080";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DAEMON_ADDR: &str = "127.0.0.1:8898";

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Effective configuration after all layers are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the notification feed (`GET {host}/api/notifications`).
    pub notification_host: String,
    /// Base URL of the order service (`{host}/v1/order...`).
    pub order_host: String,
    /// Seconds between two scheduled polls. Must be non-zero.
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub daemon_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            notification_host: DEFAULT_NOTIFICATION_HOST.to_string(),
            order_host: DEFAULT_ORDER_HOST.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            daemon_addr: DEFAULT_DAEMON_ADDR.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_with(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build from an already-merged config document (see [`LoadedConfig`]).
    ///
    /// Keys absent from the document keep their defaults.
    pub fn from_json(v: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(Self::default()).context("default config encode")?;
        merge_into(&mut base, v.clone());
        let cfg: Self = serde_json::from_value(base).context("config document has wrong shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply environment overrides using `lookup` as the variable source.
    ///
    /// Empty values are ignored so an exported-but-blank variable never wipes
    /// a default.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_NOTIFICATION_HOST) {
            self.notification_host = v;
        }
        if let Some(v) = get(ENV_ORDER_HOST) {
            self.order_host = v;
        }
        if let Some(v) = get(ENV_POLL_INTERVAL_SECS) {
            self.poll_interval_secs = v
                .parse()
                .with_context(|| format!("{ENV_POLL_INTERVAL_SECS} must be an integer, got '{v}'"))?;
        }
        if let Some(v) = get(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = v.parse().with_context(|| {
                format!("{ENV_REQUEST_TIMEOUT_SECS} must be an integer, got '{v}'")
            })?;
        }
        if let Some(v) = get(ENV_DAEMON_ADDR) {
            self.daemon_addr = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("CONFIG_INVALID: poll_interval_secs must be > 0");
        }
        if self.request_timeout_secs == 0 {
            bail!("CONFIG_INVALID: request_timeout_secs must be > 0");
        }
        for (name, url) in [
            ("notification_host", &self.notification_host),
            ("order_host", &self.order_host),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("CONFIG_INVALID: {name} must be an http(s) URL, got '{url}'");
            }
        }
        Ok(())
    }

    /// Notification feed endpoint.
    pub fn notifications_url(&self) -> String {
        format!("{}/api/notifications", self.notification_host.trim_end_matches('/'))
    }

    /// Order service base, without trailing slash.
    pub fn order_base(&self) -> String {
        self.order_host.trim_end_matches('/').to_string()
    }
}

// ---------------------------------------------------------------------------
// Layered YAML
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Resolve the dashboard config from this document, then apply the
    /// process environment on top.
    pub fn resolve(&self) -> Result<DashboardConfig> {
        let mut cfg = DashboardConfig::from_json(&self.config_json)?;
        cfg.apply_env_with(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

/// Like [`deep_merge`] but a YAML `~` never overrides a concrete value.
fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge_into(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, v) => *slot = v,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
