//! taskmark-deploy - Deployment library for the TaskMarketplace tooling.
//!
//! This crate provides the pieces for deploying a compiled contract artifact
//! to an Ethereum JSON-RPC node: artifact resolution, transaction submission,
//! and confirmation tracking.

mod artifact;
pub use artifact::{ArtifactStore, ContractFactory};

mod chain;
pub use chain::{ChainBackend, DeploymentReceipt, RpcChain};

mod config;
pub use config::{CONFIG_FILENAME, DEFAULT_CONTRACT, DeployConfig};

pub mod deployment;
pub use deployment::{ConfirmedDeployment, PendingDeployment};

mod rpc;
