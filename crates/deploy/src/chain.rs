//! Chain client: transaction submission and confirmation over JSON-RPC.

use std::time::{Duration, Instant};

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::rpc;

/// Interval between receipt polls unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The submission/confirmation seam the deployment flow drives.
///
/// Implemented by [`RpcChain`] against a real node; tests substitute stubs.
#[allow(async_fn_in_trait)]
pub trait ChainBackend {
    /// Broadcast a contract creation transaction and return its hash.
    ///
    /// Returning does not mean the transaction is mined, only accepted by the
    /// node for broadcast.
    async fn submit_deployment(&self, bytecode: &Bytes) -> Result<B256>;

    /// Suspend until the transaction is mined and accepted as successful.
    ///
    /// A reverted transaction is an error, never a receipt.
    async fn await_receipt(&self, tx_hash: B256) -> Result<DeploymentReceipt>;
}

/// The subset of an Ethereum transaction receipt the deployer cares about.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    pub transaction_hash: B256,
    /// Populated by the node only for contract creation transactions.
    pub contract_address: Option<Address>,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub block_number: u64,
    /// `1` for success, `0` for a revert.
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub status: u64,
}

/// Deserialize a u64 from a hex string (with 0x prefix).
fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_hex_u64(&s).map_err(serde::de::Error::custom)
}

/// Parse a 0x-prefixed hex quantity.
fn parse_hex_u64(raw: &str) -> Result<u64> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .with_context(|| format!("Failed to parse hex quantity: {raw}"))
}

/// JSON-RPC chain client.
///
/// Signing is delegated to the node: deployments are submitted with
/// `eth_sendTransaction` from an account the node manages (the dev-node /
/// hardhat model). The client never holds key material.
pub struct RpcChain {
    client: reqwest::Client,
    url: String,
    sender: Address,
    poll_interval: Duration,
    confirmations: u64,
    timeout: Option<Duration>,
}

impl RpcChain {
    /// Create a client for the given endpoint, sending from `sender`.
    pub fn new(url: impl Into<String>, sender: Address) -> Result<Self> {
        let url = url.into();
        url::Url::parse(&url).with_context(|| format!("Invalid RPC URL: {url}"))?;

        Ok(Self {
            client: rpc::create_client()?,
            url,
            sender,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmations: 1,
            timeout: None,
        })
    }

    /// Set the interval between confirmation polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the confirmation depth before a deployment counts as final.
    ///
    /// One confirmation is the mined receipt itself.
    pub fn confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Bound the total confirmation wait.
    ///
    /// Without a bound the client polls until the node reports the
    /// transaction mined.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// First account managed by the node (`eth_accounts`), the conventional
    /// dev-node deployer account.
    pub async fn first_account(url: &str) -> Result<Address> {
        let client = rpc::create_client()?;
        let accounts: Vec<Address> = rpc::call(&client, url, "eth_accounts", vec![]).await?;

        accounts
            .first()
            .copied()
            .context("Node manages no accounts; pass an explicit sender address")
    }

    /// Query `eth_chainId` and parse the hex result.
    pub async fn chain_id(&self) -> Result<u64> {
        let result: String = rpc::call(&self.client, &self.url, "eth_chainId", vec![]).await?;
        parse_hex_u64(&result)
    }

    /// Query `eth_blockNumber` and parse the hex result.
    async fn block_number(&self) -> Result<u64> {
        let result: String = rpc::call(&self.client, &self.url, "eth_blockNumber", vec![]).await?;
        parse_hex_u64(&result)
    }

    fn check_deadline(&self, started: Instant, tx_hash: B256) -> Result<()> {
        if let Some(limit) = self.timeout {
            if started.elapsed() > limit {
                anyhow::bail!(
                    "Timed out after {}s waiting for transaction {tx_hash} to be confirmed",
                    limit.as_secs()
                );
            }
        }
        Ok(())
    }
}

impl ChainBackend for RpcChain {
    async fn submit_deployment(&self, bytecode: &Bytes) -> Result<B256> {
        rpc::call(
            &self.client,
            &self.url,
            "eth_sendTransaction",
            vec![serde_json::json!({
                "from": self.sender,
                "data": bytecode,
            })],
        )
        .await
        .context("Failed to submit deployment transaction")
    }

    async fn await_receipt(&self, tx_hash: B256) -> Result<DeploymentReceipt> {
        let started = Instant::now();

        let receipt = loop {
            self.check_deadline(started, tx_hash)?;

            let receipt: Option<DeploymentReceipt> = rpc::call(
                &self.client,
                &self.url,
                "eth_getTransactionReceipt",
                vec![serde_json::json!(tx_hash)],
            )
            .await
            .context("Failed to query transaction receipt")?;

            match receipt {
                Some(receipt) => break receipt,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction not mined yet, polling...");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        };

        if receipt.status != 1 {
            anyhow::bail!("Transaction {tx_hash} reverted on-chain");
        }

        // The mined receipt is the first confirmation; wait out any extra depth.
        if self.confirmations > 1 {
            let target = receipt.block_number + self.confirmations - 1;
            loop {
                self.check_deadline(started, tx_hash)?;

                let head = self.block_number().await?;
                if head >= target {
                    break;
                }

                tracing::debug!(head, target, "Waiting for confirmation depth...");
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Ok(receipt)
    }
}
