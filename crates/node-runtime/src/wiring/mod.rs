//! # Subsystem Wiring
//!
//! Connects the components built by the container and starts their tasks.
//!
//! ```text
//!  client ──propagate_transaction──▶ OrderingGate ──▶ LoopbackOrderingService
//!                                       ▲   │                    │
//!                         on_proposal ──┘   │ ProposalStream     │ every proposal_delay
//!                                           ▼                    │
//!                                   ConsensusAdapter ◀───────────┘ (via gate buffer)
//!                                           │
//!                              BlockCommitted on the event bus
//!                                           │
//!                              CommitLink ──┴──▶ OrderingGate::on_commit
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use ordering_gate::OrderingGateApi;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::container::SubsystemContainer;

/// Link the gate to consensus commits and spawn the consensus and ordering
/// tasks. A failed link aborts startup.
///
/// A gate configured to start locked is unlocked once here: the top block of
/// the stored chain is the round already closed, and no other commit will
/// arrive until a proposal is released.
pub fn start_subsystems(
    container: &SubsystemContainer,
    shutdown: &watch::Receiver<bool>,
) -> Result<Vec<JoinHandle<()>>> {
    container
        .ordering_gate
        .set_commit_link(&Arc::downgrade(&container.consensus))
        .context("Failed to link ordering gate to consensus")?;

    if !container.ordering_gate.config().start_unlocked {
        info!(
            height = container.block_store.height(),
            "Gate starts locked, stored top block closes the first round"
        );
        container.ordering_gate.on_commit();
    }

    let proposals = container
        .ordering_gate
        .proposal_stream()
        .context("Proposal stream already taken")?;

    let consensus = tokio::spawn(
        Arc::clone(&container.consensus).run(proposals, shutdown.clone()),
    );
    let ordering = tokio::spawn(
        Arc::clone(&container.ordering_service)
            .run(Arc::clone(&container.ordering_gate), shutdown.clone()),
    );

    info!("Ordering gate linked, consensus and ordering tasks started");
    Ok(vec![consensus, ordering])
}
