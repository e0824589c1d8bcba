use std::collections::BTreeMap;
use std::time::Duration;

use mcu_tpa::TpaConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid plugin config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tpa.timeout_secs must be at least 1")]
    ZeroTimeout,
}

/// Contents of `plugins/<name>/config.json`. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub tpa: TpaSection,
    #[serde(default)]
    pub god: GodSection,
    /// Overrides for the built-in message templates.
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
}

fn default_prefix() -> String {
    "&8[&bUtility&8] &r".into()
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            tpa: TpaSection::default(),
            god: GodSection::default(),
            messages: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpaSection {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub allow_self_request: bool,
    #[serde(default = "default_true")]
    pub notify_counterpart: bool,
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for TpaSection {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            timeout_secs: default_timeout_secs(),
            allow_self_request: false,
            notify_counterpart: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GodSection {
    /// Also freeze the food bar of god-mode players.
    #[serde(default = "default_true")]
    pub prevent_hunger: bool,
}

impl Default for GodSection {
    fn default() -> Self {
        Self {
            prevent_hunger: true,
        }
    }
}

impl PluginConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: PluginConfig = serde_json::from_value(value)?;
        if config.tpa.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ConfigError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn tpa_config(&self) -> TpaConfig {
        TpaConfig {
            cooldown: Duration::from_secs(self.tpa.cooldown_secs),
            timeout: Duration::from_secs(self.tpa.timeout_secs),
            allow_self_request: self.tpa.allow_self_request,
            notify_counterpart: self.tpa.notify_counterpart,
        }
    }
}
