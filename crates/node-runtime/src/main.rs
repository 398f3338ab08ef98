//! # Ledger Node
//!
//! ## Startup Sequence
//!
//! 1. Parse command line (`--config`, `--genesis_block`, `--keypair_name`)
//! 2. Load configuration, genesis block and keypair; any failure exits 1
//! 3. Initialize block store and world state, applying genesis if empty
//! 4. Link the ordering gate to consensus and start subsystem tasks
//! 5. Run until Ctrl+C, then shut down

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use node_runtime::genesis::load_genesis;
use node_runtime::{NodeConfig, NodeKeypair, NodeRuntime};

/// Ledger node daemon
#[derive(Parser, Debug)]
#[command(name = "node-runtime")]
#[command(about = "Permissioned ledger node")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long)]
    config: PathBuf,

    /// Path to the genesis block (JSON)
    #[arg(long = "genesis_block")]
    genesis_block: PathBuf,

    /// Path prefix of the keypair files (`<name>.pub`, `<name>.priv`)
    #[arg(long = "keypair_name")]
    keypair_name: PathBuf,
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_inputs(args: &Args) -> Result<(NodeConfig, shared_types::Block, NodeKeypair)> {
    let config = NodeConfig::load(&args.config).context("Failed to load configuration")?;
    let genesis = load_genesis(&args.genesis_block).context("Failed to load genesis block")?;
    let keypair = NodeKeypair::load(&args.keypair_name).context("Failed to load keypair")?;
    Ok((config, genesis, keypair))
}

async fn run(args: Args) -> Result<()> {
    let (config, genesis, keypair) = load_inputs(&args)?;
    info!(public_key = %hex::encode(keypair.public_key()), "Node identity loaded");

    let runtime = NodeRuntime::new(config, &genesis, &keypair)?;
    runtime.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
