use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tripwire_core::DEFAULT_PLACEMENT_ATTEMPTS;
use tripwire_protocol::Limits;

pub const DEFAULT_IDEMPOTENCY_TTL_SECS: u64 = 10 * 60;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Service settings, read from a TOML file. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// How long a create response is replayed for the same idempotency key.
    pub idempotency_ttl_secs: u64,
    /// Period of the expired-entry sweep. 0 disables the sweeper.
    pub sweep_interval_secs: u64,
    pub placement_attempts: usize,
    /// Fixed seed for mine placement; random when absent.
    pub seed: Option<u64>,
    pub limits: Limits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_secs: DEFAULT_IDEMPOTENCY_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            seed: None,
            limits: Limits::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn idempotency_ttl(&self) -> TimeDelta {
        i64::try_from(self.idempotency_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}
