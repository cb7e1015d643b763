//! Contract artifact resolution.
//!
//! Artifacts are the JSON files emitted by the Solidity toolchain (hardhat
//! layout): `contractName`, `abi`, and the 0x-prefixed creation `bytecode`.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::chain::ChainBackend;
use crate::deployment::PendingDeployment;

/// On-disk artifact JSON, as written by the compiler.
#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(rename = "contractName", default)]
    contract_name: Option<String>,
    #[serde(default)]
    abi: Vec<Value>,
    bytecode: String,
}

/// Resolver mapping contract names to deployable factories.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at the compiled artifact directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a contract name to a deployable [`ContractFactory`].
    ///
    /// Fails if the name is empty, no artifact exists for it, or the artifact
    /// carries no creation bytecode.
    pub fn get_factory(&self, name: &str) -> Result<ContractFactory> {
        if name.is_empty() {
            anyhow::bail!("Contract name must not be empty");
        }

        let path = self.locate(name)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let artifact: ArtifactFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {} as JSON", path.display()))?;

        let bytecode = decode_bytecode(&artifact.bytecode)
            .with_context(|| format!("Invalid bytecode in artifact {}", path.display()))?;
        if bytecode.is_empty() {
            anyhow::bail!(
                "Artifact for {name} has no creation bytecode (abstract contract or interface?)"
            );
        }

        Ok(ContractFactory {
            name: artifact.contract_name.unwrap_or_else(|| name.to_string()),
            bytecode,
            constructor_inputs: constructor_arity(&artifact.abi),
        })
    }

    /// Find the artifact JSON for `name` under the store root.
    ///
    /// Checks the flat layout (`<root>/<Name>.json`) and the hardhat layout
    /// (`<root>/contracts/<Name>.sol/<Name>.json`) before falling back to a
    /// recursive scan.
    fn locate(&self, name: &str) -> Result<PathBuf> {
        let file_name = format!("{name}.json");

        let flat = self.root.join(&file_name);
        if flat.is_file() {
            return Ok(flat);
        }

        let nested = self
            .root
            .join("contracts")
            .join(format!("{name}.sol"))
            .join(&file_name);
        if nested.is_file() {
            return Ok(nested);
        }

        if let Some(found) = scan_for(&self.root, &file_name) {
            return Ok(found);
        }

        anyhow::bail!(
            "Artifact not found for contract {name} under {} (is the contract compiled?)",
            self.root.display()
        )
    }
}

/// Depth-first scan for an exact artifact file name.
fn scan_for(dir: &Path, file_name: &str) -> Option<PathBuf> {
    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = scan_for(&path, file_name) {
                return Some(found);
            }
        } else if path.file_name().is_some_and(|f| f == file_name) {
            return Some(path);
        }
    }
    None
}

/// Decode the 0x-prefixed creation bytecode.
fn decode_bytecode(raw: &str) -> Result<Bytes> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(stripped).context("Failed to decode bytecode as hex")?;
    Ok(Bytes::from(bytes))
}

/// Number of constructor inputs declared in the ABI.
fn constructor_arity(abi: &[Value]) -> usize {
    abi.iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some("constructor"))
        .and_then(|c| c.get("inputs").and_then(Value::as_array).map(Vec::len))
        .unwrap_or(0)
}

/// A deployable handle for one compiled contract.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    name: String,
    bytecode: Bytes,
    constructor_inputs: usize,
}

impl ContractFactory {
    /// The contract name, as recorded in the artifact.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The creation bytecode.
    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Submit the creation transaction for this contract.
    ///
    /// Deployments carry no constructor arguments; a factory whose ABI
    /// declares constructor inputs is rejected rather than silently deployed
    /// with empty calldata.
    pub async fn deploy<C: ChainBackend>(&self, chain: &C) -> Result<PendingDeployment> {
        if self.constructor_inputs > 0 {
            anyhow::bail!(
                "Contract {} expects {} constructor argument(s), none supplied",
                self.name,
                self.constructor_inputs
            );
        }

        let tx_hash = chain
            .submit_deployment(&self.bytecode)
            .await
            .with_context(|| format!("Failed to submit deployment of {}", self.name))?;

        Ok(PendingDeployment::new(self.name.clone(), tx_hash))
    }
}
