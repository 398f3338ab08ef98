//! # Node Runtime
//!
//! Lifecycle of a running node: start the subsystem tasks, accept client
//! transactions, and shut down in order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ordering_gate::{OrderingGateApi, TransportError};
use parking_lot::Mutex;
use shared_types::{Block, Transaction};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{NodeConfig, SubsystemContainer};
use crate::keypair::NodeKeypair;
use crate::wiring;

/// Time allowed for subsystem tasks to stop after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    /// Build every subsystem. Storage and world state are initialized here;
    /// nothing runs until `start`.
    pub fn new(config: NodeConfig, genesis: &Block, keypair: &NodeKeypair) -> Result<Self> {
        let container = Arc::new(SubsystemContainer::new(
            config,
            genesis,
            keypair.public_key(),
        )?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Link the ordering gate and start the subsystem tasks.
    pub fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Ledger Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let handles = wiring::start_subsystems(&self.container, &self.shutdown_rx)?;
        self.tasks.lock().extend(handles);

        let config = &self.container.config;
        info!("Torii Port: {}", config.torii_port);
        info!("Internal Port: {}", config.internal_port);
        info!("Block Store: {:?}", config.block_store_path);
        info!("Ledger Height: {}", self.container.block_store.height());
        Ok(())
    }

    /// Hand a client transaction to the ordering gate.
    pub fn submit_transaction(&self, transaction: Transaction) -> Result<(), TransportError> {
        self.container
            .ordering_gate
            .propagate_transaction(Arc::new(transaction))
    }

    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }

    /// Shutdown the node gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal shutdown to all tasks
    /// 2. Wait for them (bounded by a grace period)
    /// 3. Disconnect the ordering gate from consensus
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Task ended abnormally: {}", e),
                Err(_) => warn!("Task did not stop within {:?}", SHUTDOWN_GRACE),
            }
        }

        self.container.ordering_gate.disconnect();
        info!("Shutdown complete");
    }
}
