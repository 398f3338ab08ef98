//! # Subsystem Container
//!
//! Builds and owns the node's components.
//!
//! ## Initialization Order
//!
//! ```text
//! 1. Block store (open or create)
//! 2. World state (replay stored chain, or apply genesis to an empty store)
//! 3. Event bus
//! 4. Consensus adapter
//! 5. Loopback ordering service
//! 6. Ordering gate
//! ```
//!
//! The gate is not linked to consensus here; that needs a running tokio
//! runtime and happens in `wiring`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ordering_gate::{OrderingGate, OrderingGateTransport};
use shared_bus::{InMemoryEventBus, LedgerEvent};
use shared_types::{hash_hex, Block, PublicKey};
use tracing::info;
use world_state::{InMemoryWorldState, WsvCommand};

use crate::adapters::{ConsensusAdapter, FlatFileBlockStore, LoopbackOrderingService};
use crate::container::config::NodeConfig;

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    pub config: NodeConfig,
    /// The node's own public key.
    pub public_key: PublicKey,
    pub event_bus: Arc<InMemoryEventBus>,
    pub world_state: Arc<InMemoryWorldState>,
    pub block_store: Arc<FlatFileBlockStore>,
    pub consensus: Arc<ConsensusAdapter>,
    pub ordering_service: Arc<LoopbackOrderingService>,
    pub ordering_gate: Arc<OrderingGate>,
}

impl SubsystemContainer {
    pub fn new(config: NodeConfig, genesis: &Block, public_key: PublicKey) -> Result<Self> {
        info!(public_key = %hex::encode(public_key), "Initializing subsystems");

        let block_store = Arc::new(
            FlatFileBlockStore::open(&config.block_store_path)
                .context("Failed to open block store")?,
        );
        let world_state = Arc::new(InMemoryWorldState::new());
        let event_bus = Arc::new(InMemoryEventBus::new());

        if block_store.is_empty() {
            initialize_genesis(genesis, &world_state, &block_store, &event_bus)?;
        } else {
            replay_chain(genesis, &world_state, &block_store)?;
        }

        let consensus = Arc::new(ConsensusAdapter::new(
            Arc::clone(&event_bus),
            Arc::clone(&world_state),
            Arc::clone(&block_store),
            Duration::from_millis(config.vote_delay_ms),
        ));
        let ordering_service = Arc::new(LoopbackOrderingService::new(
            block_store.height() + 1,
            config.max_proposal_size,
            Duration::from_millis(config.proposal_delay_ms),
        ));
        let transport: Arc<dyn OrderingGateTransport> = ordering_service.clone();
        let ordering_gate = Arc::new(OrderingGate::with_config(
            transport,
            config.ordering.clone(),
        ));

        info!(height = block_store.height(), "All subsystems initialized");
        Ok(Self {
            config,
            public_key,
            event_bus,
            world_state,
            block_store,
            consensus,
            ordering_service,
            ordering_gate,
        })
    }
}

fn initialize_genesis(
    genesis: &Block,
    world_state: &InMemoryWorldState,
    block_store: &FlatFileBlockStore,
    event_bus: &InMemoryEventBus,
) -> Result<()> {
    info!("Block store is empty, applying genesis block");
    world_state
        .apply_block(genesis)
        .context("Genesis block does not apply to an empty world state")?;
    block_store
        .add(genesis)
        .context("Failed to store genesis block")?;

    let block_hash = genesis.hash();
    info!(hash = %hash_hex(&block_hash), "Genesis block stored");
    event_bus.publish_now(LedgerEvent::GenesisInitialized {
        block_hash,
        transactions: genesis.transactions.len(),
    });
    Ok(())
}

/// Rebuild the world state from the blocks already on disk.
fn replay_chain(
    genesis: &Block,
    world_state: &InMemoryWorldState,
    block_store: &FlatFileBlockStore,
) -> Result<()> {
    let height = block_store.height();
    info!(height, "Replaying stored chain");

    for h in 1..=height {
        let block = block_store
            .get(h)
            .with_context(|| format!("Failed to read stored block {h}"))?
            .with_context(|| format!("Stored block {h} is missing"))?;
        if h == 1 && block.hash() != genesis.hash() {
            bail!("Stored genesis differs from --genesis_block");
        }
        world_state
            .apply_block(&block)
            .with_context(|| format!("Stored block {h} does not apply"))?;
    }
    Ok(())
}
