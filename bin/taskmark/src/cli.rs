use std::path::PathBuf;

use alloy_core::primitives::Address;
use clap::Parser;
use taskmark_deploy::{DEFAULT_CONTRACT, DeployConfig};
use tracing::level_filters::LevelFilter;

/// The default target network (local dev node).
const DEFAULT_NETWORK: Network = Network::Localhost;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    Localhost,
    Sepolia,
    #[strum(default)]
    Custom(String),
}

impl Network {
    pub fn to_rpc_url(&self) -> String {
        match self {
            Network::Localhost => "http://localhost:8545".to_string(),
            Network::Sepolia => "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            Network::Custom(url) => url.clone(),
        }
    }
}

#[derive(Parser)]
#[command(name = "taskmark")]
#[command(
    author,
    version,
    about = "Deploy the TaskMarketplace contract and report its address"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "TASKMARK_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The target network: localhost, sepolia, or a custom RPC URL.
    #[arg(short, long, env = "TASKMARK_NETWORK", default_value_t = DEFAULT_NETWORK)]
    pub network: Network,

    /// Sender account for the deployment transaction.
    ///
    /// If not provided, the first account managed by the node is used (the
    /// conventional dev-node deployer account).
    #[arg(long, alias = "sender", env = "TASKMARK_FROM")]
    pub from: Option<Address>,

    /// Root directory of the compiled contract artifacts.
    #[arg(long, env = "TASKMARK_ARTIFACTS", default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// The contract to deploy.
    #[arg(long, env = "TASKMARK_CONTRACT", default_value = DEFAULT_CONTRACT)]
    pub contract: String,

    /// Confirmation depth before the deployment counts as final.
    #[arg(long, env = "TASKMARK_CONFIRMATIONS", default_value_t = 1)]
    pub confirmations: u64,

    /// Seconds between receipt polls while waiting for confirmation.
    #[arg(long, env = "TASKMARK_POLL_INTERVAL", default_value_t = 2)]
    pub poll_interval: u64,

    /// Optional bound, in seconds, on the confirmation wait.
    ///
    /// Without a bound the deployer waits until the node reports the
    /// transaction mined.
    #[arg(long, env = "TASKMARK_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Path to an existing Taskmark.toml configuration file to load.
    ///
    /// When provided, the deployment uses the configuration from this file
    /// instead of the other CLI arguments.
    #[arg(long, alias = "conf", env = "TASKMARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Save the effective configuration to Taskmark.toml in the current
    /// directory before deploying.
    #[arg(long, env = "TASKMARK_SAVE_CONFIG")]
    pub save_config: bool,
}

impl Cli {
    /// Fold the CLI arguments into a deployment configuration, loading from
    /// file when `--config` is given.
    pub fn to_config(&self) -> anyhow::Result<DeployConfig> {
        if let Some(path) = &self.config {
            return DeployConfig::load_from_file(path);
        }

        Ok(DeployConfig {
            rpc_url: self.network.to_rpc_url(),
            sender: self.from,
            artifacts_dir: self.artifacts.clone(),
            contract: self.contract.clone(),
            poll_interval_secs: self.poll_interval,
            confirmations: self.confirmations,
            timeout_secs: self.timeout,
        })
    }
}
