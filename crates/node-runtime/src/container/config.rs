//! # Node Configuration
//!
//! Runtime parameters read from the JSON file passed with `--config`.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Ports can also be overridden from the environment
//! (`NODE_TORII_PORT`, `NODE_INTERNAL_PORT`).

use std::path::{Path, PathBuf};

use ordering_gate::OrderingGateConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable overriding `torii_port`.
pub const ENV_TORII_PORT: &str = "NODE_TORII_PORT";
/// Environment variable overriding `internal_port`.
pub const ENV_INTERNAL_PORT: &str = "NODE_INTERNAL_PORT";

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Directory holding one JSON file per committed block.
    pub block_store_path: PathBuf,
    /// Client-facing API port.
    pub torii_port: u16,
    /// Peer-to-peer port.
    pub internal_port: u16,
    /// Maximum transactions per proposal.
    pub max_proposal_size: usize,
    /// Interval between proposals, milliseconds.
    pub proposal_delay_ms: u64,
    /// Delay before a vote is cast, milliseconds.
    pub vote_delay_ms: u64,
    /// Delay before a missing block is fetched from peers, milliseconds.
    /// A single node never fetches blocks; the field is read so existing
    /// config files keep parsing, and is otherwise unused.
    pub load_delay_ms: u64,
    /// Ordering gate settings.
    pub ordering: OrderingGateConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            block_store_path: PathBuf::from("./block_store"),
            torii_port: 50051,
            internal_port: 10001,
            max_proposal_size: 10,
            proposal_delay_ms: 5000,
            vote_delay_ms: 5000,
            load_delay_ms: 5000,
            ordering: OrderingGateConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Read, override from the environment, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Apply port overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = port_override(&lookup, ENV_TORII_PORT) {
            self.torii_port = port;
        }
        if let Some(port) = port_override(&lookup, ENV_INTERNAL_PORT) {
            self.internal_port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_store_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "block_store_path must not be empty".into(),
            ));
        }
        if self.max_proposal_size == 0 {
            return Err(ConfigError::Invalid(
                "max_proposal_size must be positive".into(),
            ));
        }
        if self.proposal_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "proposal_delay_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn port_override<F>(lookup: &F, key: &str) -> Option<u16>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)?;
    match value.parse() {
        Ok(port) => {
            info!(key, port, "Port overridden from environment");
            Some(port)
        }
        Err(_) => {
            warn!(key, value = %value, "Ignoring malformed port override");
            None
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
