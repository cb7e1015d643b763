//! Deployment configuration with TOML persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The default name for the taskmark configuration file.
pub const CONFIG_FILENAME: &str = "Taskmark.toml";

/// The contract this tool exists to deploy.
pub const DEFAULT_CONTRACT: &str = "TaskMarketplace";

/// Everything a deployment run needs, serializable to/from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// JSON-RPC endpoint of the target node.
    pub rpc_url: String,
    /// Sender account. When absent, the node's first managed account is used.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sender: Option<Address>,
    /// Root of the compiled artifact tree.
    pub artifacts_dir: PathBuf,
    /// Contract to deploy.
    pub contract: String,
    /// Seconds between receipt polls while waiting for confirmation.
    pub poll_interval_secs: u64,
    /// Confirmation depth before the deployment counts as final.
    pub confirmations: u64,
    /// Optional bound on the total confirmation wait, in seconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timeout_secs: Option<u64>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            sender: None,
            artifacts_dir: PathBuf::from("artifacts"),
            contract: DEFAULT_CONTRACT.to_string(),
            poll_interval_secs: 2,
            confirmations: 1,
            timeout_secs: None,
        }
    }
}

impl DeployConfig {
    /// The receipt polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// The confirmation wait bound, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file, or from a directory
    /// containing one under the default name.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file or directory not found: {}",
                path.display()
            );
        }

        let config_path = if path.is_dir() {
            path.join(CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to the default location in the current
    /// directory.
    pub fn save_config(&self) -> Result<PathBuf> {
        let config_path = PathBuf::from(CONFIG_FILENAME);
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }
}
