//! taskmark is a CLI tool that deploys the TaskMarketplace contract to an
//! Ethereum node and reports the resulting address.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use taskmark_deploy::{ArtifactStore, ConfirmedDeployment, RpcChain, deployment};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize the logger. Logs go to stderr so the address report line is
    // the only thing on stdout.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let outcome = run(cli).await;
    match &outcome {
        Ok(deployment) => println!("{}", success_line(deployment)),
        Err(error) => eprintln!("Error: {error:#}"),
    }

    ExitCode::from(exit_status(&outcome))
}

/// Map the run outcome to the process exit status.
///
/// Every failure kind maps to the same nonzero status; the error is never
/// classified further.
fn exit_status(outcome: &Result<ConfirmedDeployment>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Execute one deployment run.
///
/// All failures surface here as a single error value; `main` maps the outcome
/// to the process exit code.
async fn run(cli: Cli) -> Result<ConfirmedDeployment> {
    let config = cli.to_config()?;

    if cli.save_config {
        config.save_config()?;
    }

    tracing::info!(
        rpc_url = %config.rpc_url,
        contract = %config.contract,
        artifacts_dir = %config.artifacts_dir.display(),
        "Starting deployment..."
    );

    let sender = match config.sender {
        Some(sender) => sender,
        None => RpcChain::first_account(&config.rpc_url)
            .await
            .context("Failed to resolve a sender account from the node")?,
    };

    let chain = RpcChain::new(&config.rpc_url, sender)?
        .poll_interval(config.poll_interval())
        .confirmations(config.confirmations)
        .timeout(config.timeout());

    let chain_id = chain
        .chain_id()
        .await
        .context("Failed to reach the RPC endpoint")?;
    tracing::info!(chain_id, sender = %sender, "Connected to node");

    let store = ArtifactStore::new(&config.artifacts_dir);

    deployment::run(&store, &chain, &config.contract).await
}

/// The success report printed to stdout.
fn success_line(deployment: &ConfirmedDeployment) -> String {
    format!(
        "{} deployed to: {}",
        deployment.contract_name, deployment.address
    )
}
