//! # Transaction Ordering Adapter
//!
//! Loopback ordering service for a single node. Transactions the gate
//! propagates are queued here; every `proposal_delay` the queue is cut into a
//! proposal of at most `max_proposal_size` transactions and handed back to
//! the gate as if it had arrived from the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ordering_gate::{OrderingGateApi, OrderingGateTransport, TransportError};
use parking_lot::Mutex;
use shared_types::{Proposal, Transaction};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

pub struct LoopbackOrderingService {
    queue: Mutex<VecDeque<Arc<Transaction>>>,
    next_height: AtomicU64,
    max_proposal_size: usize,
    proposal_delay: Duration,
    closed: AtomicBool,
}

impl LoopbackOrderingService {
    /// `next_height` is the height of the first proposal this service builds.
    pub fn new(next_height: u64, max_proposal_size: usize, proposal_delay: Duration) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            next_height: AtomicU64::new(next_height),
            max_proposal_size,
            proposal_delay,
            closed: AtomicBool::new(false),
        }
    }

    /// Number of transactions waiting for a proposal.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Cut the next proposal from the queue, if anything is waiting.
    pub fn next_proposal(&self) -> Option<Proposal> {
        let batch: Vec<Transaction> = {
            let mut queue = self.queue.lock();
            if queue.is_empty() {
                return None;
            }
            let take = queue.len().min(self.max_proposal_size);
            queue
                .drain(..take)
                .map(|tx| Arc::try_unwrap(tx).unwrap_or_else(|shared| (*shared).clone()))
                .collect()
        };
        let height = self.next_height.fetch_add(1, Ordering::SeqCst);
        Some(Proposal::new(height, batch))
    }

    /// Emit proposals into `gate` until shutdown.
    pub async fn run<G>(
        self: Arc<Self>,
        gate: Arc<G>,
        mut shutdown: watch::Receiver<bool>,
    ) where
        G: OrderingGateApi + ?Sized,
    {
        let mut ticker = interval(self.proposal_delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(proposal) = self.next_proposal() {
                        debug!(
                            height = proposal.height,
                            transactions = proposal.len(),
                            "[ordering] Proposal built"
                        );
                        gate.on_proposal(proposal);
                    }
                }
                _ = shutdown.changed() => {
                    info!("[ordering] Shutdown signal received");
                    break;
                }
            }
        }
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl OrderingGateTransport for LoopbackOrderingService {
    fn propagate_transaction(&self, transaction: Arc<Transaction>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.queue.lock().push_back(transaction);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(counter: u64) -> Arc<Transaction> {
        Arc::new(Transaction::new("admin@test", counter))
    }

    #[test]
    fn test_proposals_respect_size_and_order() {
        let service = LoopbackOrderingService::new(2, 2, Duration::from_millis(10));
        for counter in 1..=5 {
            service.propagate_transaction(tx(counter)).unwrap();
        }

        let heights_and_counters: Vec<(u64, Vec<u64>)> =
            std::iter::from_fn(|| service.next_proposal())
                .map(|p| {
                    (
                        p.height,
                        p.transactions.iter().map(|t| t.tx_counter).collect(),
                    )
                })
                .collect();

        assert_eq!(
            heights_and_counters,
            vec![(2, vec![1, 2]), (3, vec![3, 4]), (4, vec![5])]
        );
        assert_eq!(service.pending(), 0);
    }

    #[test]
    fn test_empty_queue_builds_nothing() {
        let service = LoopbackOrderingService::new(1, 10, Duration::from_millis(10));
        assert!(service.next_proposal().is_none());
    }

    #[tokio::test]
    async fn test_closed_after_shutdown() {
        struct Sink;
        impl OrderingGateApi for Sink {
            fn propagate_transaction(
                &self,
                _transaction: Arc<Transaction>,
            ) -> Result<(), TransportError> {
                Ok(())
            }
            fn on_proposal(&self, _proposal: Proposal) {}
            fn proposal_stream(&self) -> Option<ordering_gate::ProposalStream> {
                None
            }
        }

        let service = Arc::new(LoopbackOrderingService::new(1, 10, Duration::from_millis(5)));
        let (tx_shutdown, rx_shutdown) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&service).run(Arc::new(Sink), rx_shutdown));

        tx_shutdown.send(true).unwrap();
        task.await.unwrap();

        assert!(matches!(
            service.propagate_transaction(tx(1)),
            Err(TransportError::Closed)
        ));
    }
}
