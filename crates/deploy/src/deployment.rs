//! Deployment orchestration: resolve the factory, submit the transaction,
//! await confirmation.
//!
//! The flow is one linear chain of awaited steps. Any failure aborts the
//! attempt and propagates out of [`run`]; nothing is handled or retried
//! locally. The process entry point maps the single `Result` to an exit code.

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};

use crate::artifact::ArtifactStore;
use crate::chain::ChainBackend;

/// A submitted but unconfirmed contract deployment.
///
/// Holds the transaction hash only. The contract address does not exist until
/// [`PendingDeployment::confirmed`] returns.
#[derive(Debug)]
pub struct PendingDeployment {
    contract_name: String,
    tx_hash: B256,
}

impl PendingDeployment {
    pub(crate) fn new(contract_name: String, tx_hash: B256) -> Self {
        Self {
            contract_name,
            tx_hash,
        }
    }

    /// The hash of the submitted creation transaction.
    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// The contract being deployed.
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Suspend until the chain reports the deployment mined and successful.
    ///
    /// Consumes the pending handle: afterwards the deployment is either
    /// confirmed (with an address) or failed (the error), never both.
    pub async fn confirmed<C: ChainBackend>(self, chain: &C) -> Result<ConfirmedDeployment> {
        let receipt = chain
            .await_receipt(self.tx_hash)
            .await
            .with_context(|| format!("Deployment of {} was not confirmed", self.contract_name))?;

        let address = receipt.contract_address.with_context(|| {
            format!(
                "Receipt for {} carries no contract address (not a creation transaction?)",
                self.contract_name
            )
        })?;

        Ok(ConfirmedDeployment {
            contract_name: self.contract_name,
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            address,
        })
    }
}

/// A confirmed, on-chain contract deployment.
#[derive(Debug, Clone)]
pub struct ConfirmedDeployment {
    pub contract_name: String,
    pub tx_hash: B256,
    pub block_number: u64,
    pub address: Address,
}

/// Run the full deployment sequence exactly once.
///
/// Resolve a factory for `contract`, submit its creation transaction, and
/// wait for the chain to confirm it. Any failure at any step aborts the whole
/// attempt; the error is not classified further.
pub async fn run<C: ChainBackend>(
    store: &ArtifactStore,
    chain: &C,
    contract: &str,
) -> Result<ConfirmedDeployment> {
    let factory = store
        .get_factory(contract)
        .with_context(|| format!("Failed to resolve a factory for {contract}"))?;

    tracing::info!(
        contract = factory.name(),
        bytecode_bytes = factory.bytecode().len(),
        "Resolved contract artifact"
    );

    let pending = factory.deploy(chain).await?;

    tracing::info!(
        tx_hash = %pending.tx_hash(),
        "Deployment transaction submitted, awaiting confirmation..."
    );

    let confirmed = pending.confirmed(chain).await?;

    tracing::info!(
        contract = %confirmed.contract_name,
        address = %confirmed.address,
        block = confirmed.block_number,
        "Deployment confirmed"
    );

    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::DeploymentReceipt;
    use alloy_core::primitives::Bytes;
    use std::path::Path;
    use tempdir::TempDir;

    fn deployed_at() -> Address {
        "0x5fbdb2315678afecb367f032d93f642f64180aa3"
            .parse()
            .unwrap()
    }

    fn tx_hash() -> B256 {
        "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"
            .parse()
            .unwrap()
    }

    /// Chain stub with switchable failure points.
    #[derive(Default)]
    struct StubChain {
        fail_submit: bool,
        fail_confirm: bool,
        omit_address: bool,
    }

    impl ChainBackend for StubChain {
        async fn submit_deployment(&self, _bytecode: &Bytes) -> Result<B256> {
            if self.fail_submit {
                anyhow::bail!("insufficient funds for gas");
            }
            Ok(tx_hash())
        }

        async fn await_receipt(&self, tx_hash: B256) -> Result<DeploymentReceipt> {
            if self.fail_confirm {
                anyhow::bail!("transaction reverted on-chain");
            }
            Ok(DeploymentReceipt {
                transaction_hash: tx_hash,
                contract_address: (!self.omit_address).then(deployed_at),
                block_number: 7,
                status: 1,
            })
        }
    }

    fn store_with_artifact(name: &str, abi: serde_json::Value) -> (TempDir, ArtifactStore) {
        let dir = TempDir::new("taskmark-deploy").unwrap();
        write_artifact(dir.path(), name, abi);
        let store = ArtifactStore::new(dir.path());
        (dir, store)
    }

    fn write_artifact(dir: &Path, name: &str, abi: serde_json::Value) {
        let artifact = serde_json::json!({
            "contractName": name,
            "abi": abi,
            "bytecode": "0x608060405234801561001057600080fd5b50",
        });
        std::fs::write(dir.join(format!("{name}.json")), artifact.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_run_reports_backend_address() {
        let (_dir, store) = store_with_artifact("TaskMarketplace", serde_json::json!([]));
        let chain = StubChain::default();

        let confirmed = run(&store, &chain, "TaskMarketplace").await.unwrap();

        assert_eq!(confirmed.contract_name, "TaskMarketplace");
        assert_eq!(confirmed.address, deployed_at());
        assert_eq!(confirmed.tx_hash, tx_hash());
        assert_eq!(confirmed.block_number, 7);
    }

    #[tokio::test]
    async fn test_resolution_failure_aborts_before_submission() {
        let dir = TempDir::new("taskmark-deploy").unwrap();
        let store = ArtifactStore::new(dir.path());
        let chain = StubChain::default();

        let err = run(&store, &chain, "TaskMarketplace").await.unwrap_err();
        assert!(err.to_string().contains("TaskMarketplace"));
    }

    #[tokio::test]
    async fn test_submission_failure_aborts() {
        let (_dir, store) = store_with_artifact("TaskMarketplace", serde_json::json!([]));
        let chain = StubChain {
            fail_submit: true,
            ..Default::default()
        };

        assert!(run(&store, &chain, "TaskMarketplace").await.is_err());
    }

    #[tokio::test]
    async fn test_confirmation_failure_aborts() {
        let (_dir, store) = store_with_artifact("TaskMarketplace", serde_json::json!([]));
        let chain = StubChain {
            fail_confirm: true,
            ..Default::default()
        };

        let err = run(&store, &chain, "TaskMarketplace").await.unwrap_err();
        assert!(format!("{err:#}").contains("not confirmed"));
    }

    #[tokio::test]
    async fn test_receipt_without_address_is_a_failure() {
        let (_dir, store) = store_with_artifact("TaskMarketplace", serde_json::json!([]));
        let chain = StubChain {
            omit_address: true,
            ..Default::default()
        };

        let err = run(&store, &chain, "TaskMarketplace").await.unwrap_err();
        assert!(format!("{err:#}").contains("no contract address"));
    }

    #[tokio::test]
    async fn test_constructor_arguments_are_rejected() {
        let abi = serde_json::json!([
            { "type": "constructor", "inputs": [{ "name": "owner", "type": "address" }] }
        ]);
        let (_dir, store) = store_with_artifact("Owned", abi);
        let chain = StubChain::default();

        let err = run(&store, &chain, "Owned").await.unwrap_err();
        assert!(err.to_string().contains("constructor argument"));
    }
}
