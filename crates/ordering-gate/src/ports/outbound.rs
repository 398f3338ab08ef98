//! Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::TransportError;
use shared_bus::Subscription;
use shared_types::Transaction;
use std::sync::Arc;

/// Network side of the gate: carries transactions to the ordering service.
pub trait OrderingGateTransport: Send + Sync {
    /// Disseminate `transaction` to the ordering service.
    fn propagate_transaction(&self, transaction: Arc<Transaction>) -> Result<(), TransportError>;
}

/// Consensus side of the gate: the source of commit notifications.
pub trait CommitNotifier: Send + Sync {
    /// Subscribe to the commit stream.
    ///
    /// Every `LedgerEvent::BlockCommitted` delivered on the subscription
    /// closes one round.
    fn on_commit(&self) -> Subscription;
}
