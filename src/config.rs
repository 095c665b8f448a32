//! Gate configuration
//!
//! Where the authority lives, how long each call may take, and how the
//! caller identifies itself. Values come from defaults, a JSON file, or
//! `APPROVAL_GATE_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::core::{GateError, GateResult};

pub const ENV_BASE_URL: &str = "APPROVAL_GATE_BASE_URL";
pub const ENV_ACTION_TIMEOUT_MS: &str = "APPROVAL_GATE_ACTION_TIMEOUT_MS";
pub const ENV_CLOUD_TIMEOUT_MS: &str = "APPROVAL_GATE_CLOUD_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "APPROVAL_GATE_POLL_INTERVAL_MS";
pub const ENV_WAIT_TIMEOUT_SECS: &str = "APPROVAL_GATE_WAIT_TIMEOUT_SECS";

/// Configuration shared by the dispatcher and the cloud client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Base URL of the authority and action endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call timeout for action and permission endpoints
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,

    /// Per-call timeout for the cloud proxy
    #[serde(default = "default_cloud_timeout_ms")]
    pub cloud_timeout_ms: u64,

    /// Delay between grant status checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall wait for a human decision
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Header carrying the identity on every request
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Environment variables consulted, in order, for the initial identity
    #[serde(default = "default_identity_env")]
    pub identity_env: Vec<String>,

    /// Identifier the dispatcher uses for its own persistent capability
    #[serde(default = "default_dispatcher_tool")]
    pub dispatcher_tool: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_action_timeout_ms() -> u64 {
    12_000
}

fn default_cloud_timeout_ms() -> u64 {
    40_000
}

fn default_poll_interval_ms() -> u64 {
    800
}

fn default_wait_timeout_secs() -> u64 {
    45
}

fn default_identity_header() -> String {
    "X-Kugutz-Identity".to_string()
}

fn default_identity_env() -> Vec<String> {
    vec!["KUGUTZ_IDENTITY".to_string(), "KUGUTZ_SESSION_ID".to_string()]
}

fn default_dispatcher_tool() -> String {
    "device_api".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            action_timeout_ms: default_action_timeout_ms(),
            cloud_timeout_ms: default_cloud_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            wait_timeout_secs: default_wait_timeout_secs(),
            identity_header: default_identity_header(),
            identity_env: default_identity_env(),
            dispatcher_tool: default_dispatcher_tool(),
        }
    }
}

impl GateConfig {
    /// Defaults pointed at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Defaults overridden by `APPROVAL_GATE_*` environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Load a JSON config file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: GateConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every call fail or the poller spin
    pub fn validate(&self) -> GateResult<()> {
        if self.base_url.is_empty() {
            return Err(GateError::InvalidConfig(
                "base_url must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("action_timeout_ms", self.action_timeout_ms),
            ("cloud_timeout_ms", self.cloud_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(GateError::InvalidConfig(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Apply `APPROVAL_GATE_*` overrides on top of this config
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(ms) = parse_positive(&lookup, ENV_ACTION_TIMEOUT_MS) {
            self.action_timeout_ms = ms;
        }
        if let Some(ms) = parse_positive(&lookup, ENV_CLOUD_TIMEOUT_MS) {
            self.cloud_timeout_ms = ms;
        }
        if let Some(ms) = parse_positive(&lookup, ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = ms;
        }
        if let Some(secs) = parse_override(&lookup, ENV_WAIT_TIMEOUT_SECS) {
            self.wait_timeout_secs = secs;
        }
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.normalized()
    }

    /// Set the per-call timeout for action and permission endpoints
    pub fn with_action_timeout(mut self, timeout_ms: u64) -> Self {
        self.action_timeout_ms = timeout_ms;
        self
    }

    /// Set the per-call timeout for the cloud proxy
    pub fn with_cloud_timeout(mut self, timeout_ms: u64) -> Self {
        self.cloud_timeout_ms = timeout_ms;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Set the overall approval wait
    pub fn with_wait_timeout(mut self, timeout_secs: u64) -> Self {
        self.wait_timeout_secs = timeout_secs;
        self
    }

    /// Set the identity header name
    pub fn with_identity_header(mut self, header: impl Into<String>) -> Self {
        self.identity_header = header.into();
        self
    }

    /// Set the environment variables consulted for the identity
    pub fn with_identity_env(mut self, vars: Vec<String>) -> Self {
        self.identity_env = vars;
        self
    }

    /// Set the dispatcher's own tool identifier
    pub fn with_dispatcher_tool(mut self, tool: impl Into<String>) -> Self {
        self.dispatcher_tool = tool.into();
        self
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    pub fn cloud_timeout(&self) -> Duration {
        Duration::from_millis(self.cloud_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}: not a valid number", name);
            None
        }
    }
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
    match parse_override::<u64>(lookup, name) {
        Some(0) => {
            tracing::warn!("Ignoring {}: must be greater than 0", name);
            None
        }
        other => other,
    }
}
