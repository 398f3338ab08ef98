//! Inbound Ports (Driving Ports / API)

use crate::application::stream::ProposalStream;
use crate::domain::errors::TransportError;
use shared_types::{Proposal, Transaction};
use std::sync::Arc;

/// What the rest of the node sees of the ordering gate.
///
/// Every method returns promptly; none of them waits on consensus or on the
/// network.
pub trait OrderingGateApi: Send + Sync {
    /// Forward a client transaction to the ordering service.
    fn propagate_transaction(&self, transaction: Arc<Transaction>) -> Result<(), TransportError>;

    /// Accept a proposal assembled by the ordering service.
    ///
    /// Never rejects: the proposal is buffered and released in arrival order.
    fn on_proposal(&self, proposal: Proposal);

    /// Take the outbound proposal stream.
    ///
    /// There is exactly one consumer (consensus); the first call gets the
    /// stream and every later call gets `None`.
    fn proposal_stream(&self) -> Option<ProposalStream>;
}
