//! Ordering Gate Service
//!
//! Buffers proposals from the ordering service and releases them to
//! consensus one per round.

use crate::application::commit_link::CommitLink;
use crate::application::stream::ProposalStream;
use crate::config::OrderingGateConfig;
use crate::domain::buffer::{ProposalBuffer, ReleaseOutcome};
use crate::domain::errors::{CommitLinkError, TransportError};
use crate::domain::release::ReleaseGate;
use crate::ports::inbound::OrderingGateApi;
use crate::ports::outbound::{CommitNotifier, OrderingGateTransport};
use parking_lot::Mutex;
use shared_types::{Proposal, Transaction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Snapshot of the gate's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    /// Proposals accepted by `on_proposal`.
    pub proposals_enqueued: u64,
    /// Proposals handed to the outbound stream.
    pub proposals_released: u64,
    /// Commit notifications observed.
    pub commits_observed: u64,
    /// Proposals currently waiting in the buffer.
    pub buffered: usize,
    /// Whether the release token is currently set.
    pub unlocked: bool,
}

/// The ordering gate.
///
/// # Release protocol
///
/// Runs after every `on_proposal` and every `on_commit`:
///
/// 1. Compare-and-swap the token from set to clear. Losing means a round is
///    outstanding (or no commit arrived yet) and there is nothing to do.
/// 2. Pop the buffer head and send it on the outbound stream, both under the
///    buffer lock.
/// 3. If the buffer was empty, set the token again and look at the buffer
///    once more: a proposal pushed while we held the token found it clear
///    and left, so it is ours to release.
///
/// The token is the only thing deciding who may release; the buffer lock
/// only keeps pop-and-send in one piece.
pub struct OrderingGate {
    transport: Arc<dyn OrderingGateTransport>,
    buffer: ProposalBuffer,
    release: ReleaseGate,
    outbound: mpsc::UnboundedSender<Proposal>,
    stream: Mutex<Option<ProposalStream>>,
    commit_link: Mutex<Option<CommitLink>>,
    config: OrderingGateConfig,
    proposals_enqueued: AtomicU64,
    proposals_released: AtomicU64,
    commits_observed: AtomicU64,
}

impl OrderingGate {
    /// Create a gate with default config
    pub fn new(transport: Arc<dyn OrderingGateTransport>) -> Self {
        Self::with_config(transport, OrderingGateConfig::default())
    }

    /// Create a gate with custom config
    pub fn with_config(
        transport: Arc<dyn OrderingGateTransport>,
        config: OrderingGateConfig,
    ) -> Self {
        let (outbound, receiver) = mpsc::unbounded_channel();
        info!(
            start_unlocked = config.start_unlocked,
            "Ordering gate created"
        );

        Self {
            transport,
            buffer: ProposalBuffer::new(),
            release: ReleaseGate::new(config.start_unlocked),
            outbound,
            stream: Mutex::new(Some(ProposalStream::new(receiver))),
            commit_link: Mutex::new(None),
            config,
            proposals_enqueued: AtomicU64::new(0),
            proposals_released: AtomicU64::new(0),
            commits_observed: AtomicU64::new(0),
        }
    }

    /// Bind the gate to the consensus engine's commit stream.
    ///
    /// Must run inside a tokio runtime, once, after both the gate and the
    /// consensus engine exist. A failure is a wiring error: the gate keeps
    /// buffering but never unlocks past its first outstanding round.
    pub fn set_commit_link<C>(self: &Arc<Self>, consensus: &Weak<C>) -> Result<(), CommitLinkError>
    where
        C: CommitNotifier + ?Sized,
    {
        let mut slot = self.commit_link.lock();
        if slot.is_some() {
            error!("Commit link already established");
            return Err(CommitLinkError::AlreadyLinked);
        }

        let Some(consensus) = consensus.upgrade() else {
            error!("Consensus engine is gone, cannot link ordering gate");
            return Err(CommitLinkError::ConsensusGone);
        };

        let runtime = Handle::try_current().map_err(|_| {
            error!("No tokio runtime, cannot link ordering gate");
            CommitLinkError::NoRuntime
        })?;

        let link = CommitLink::establish(
            &runtime,
            consensus.on_commit(),
            Arc::downgrade(self),
            |gate: &OrderingGate, _commit| gate.on_commit(),
        );
        *slot = Some(link);
        Ok(())
    }

    /// Consensus closed a round: set the token and try to release.
    ///
    /// Repeated commits with nothing to release leave a single token set.
    pub fn on_commit(&self) {
        self.commits_observed.fetch_add(1, Ordering::Relaxed);
        self.release.unlock();
        debug!("Round unlocked by commit");
        self.try_next_round();
    }

    /// Tear down the commit link. Idempotent.
    ///
    /// Once this returns no commit reaches the gate through the link.
    /// Proposals already released stay released.
    pub fn disconnect(&self) {
        if let Some(link) = self.commit_link.lock().as_ref() {
            link.close();
        }
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            proposals_enqueued: self.proposals_enqueued.load(Ordering::Relaxed),
            proposals_released: self.proposals_released.load(Ordering::Relaxed),
            commits_observed: self.commits_observed.load(Ordering::Relaxed),
            buffered: self.buffer.len(),
            unlocked: self.release.is_unlocked(),
        }
    }

    pub fn config(&self) -> &OrderingGateConfig {
        &self.config
    }

    fn try_next_round(&self) {
        loop {
            if !self.release.try_acquire() {
                return;
            }

            match self
                .buffer
                .release_head(|proposal| self.outbound.send(proposal).map_err(|e| e.0))
            {
                ReleaseOutcome::Released(height) => {
                    self.proposals_released.fetch_add(1, Ordering::Relaxed);
                    info!(height, "Released proposal to consensus");
                    return;
                }
                ReleaseOutcome::Refused => {
                    warn!("Proposal stream consumer is gone, keeping proposal buffered");
                    return;
                }
                ReleaseOutcome::Empty => {
                    self.release.unlock();
                    if self.buffer.is_empty() {
                        return;
                    }
                }
            }
        }
    }
}

impl OrderingGateApi for OrderingGate {
    fn propagate_transaction(&self, transaction: Arc<Transaction>) -> Result<(), TransportError> {
        info!(
            tx_counter = transaction.tx_counter,
            account_id = %transaction.creator_account_id,
            "Propagating transaction"
        );
        self.transport.propagate_transaction(transaction)
    }

    fn on_proposal(&self, proposal: Proposal) {
        let height = proposal.height;
        let tx_count = proposal.len();
        let buffered = self.buffer.push(proposal);
        self.proposals_enqueued.fetch_add(1, Ordering::Relaxed);
        info!(height, tx_count, buffered, "Received new proposal");

        if buffered >= self.config.buffer_warn_threshold {
            warn!(
                buffered,
                threshold = self.config.buffer_warn_threshold,
                "Proposal buffer is growing faster than consensus commits"
            );
        }

        self.try_next_round();
    }

    fn proposal_stream(&self) -> Option<ProposalStream> {
        self.stream.lock().take()
    }
}

impl Drop for OrderingGate {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::mocks::{MockConsensus, RecordingTransport};
    use shared_bus::LedgerEvent;
    use shared_types::Commit;
    use std::time::Duration;
    use tokio::time::timeout;

    fn proposal(height: u64) -> Proposal {
        Proposal::new(height, vec![Transaction::new("alice@wonderland", height)])
    }

    fn gate() -> OrderingGate {
        OrderingGate::new(Arc::new(RecordingTransport::default()))
    }

    fn locked_gate() -> OrderingGate {
        OrderingGate::with_config(
            Arc::new(RecordingTransport::default()),
            OrderingGateConfig {
                start_unlocked: false,
                ..Default::default()
            },
        )
    }

    fn drain(stream: &mut ProposalStream) -> Vec<u64> {
        std::iter::from_fn(|| stream.try_recv().map(|p| p.height)).collect()
    }

    #[test]
    fn test_startup_round_then_one_per_commit() {
        let gate = gate();
        let mut stream = gate.proposal_stream().unwrap();

        gate.on_proposal(proposal(1));
        gate.on_proposal(proposal(2));
        gate.on_proposal(proposal(3));
        assert_eq!(drain(&mut stream), vec![1]);

        gate.on_commit();
        assert_eq!(drain(&mut stream), vec![2]);

        gate.on_commit();
        assert_eq!(drain(&mut stream), vec![3]);

        gate.on_commit();
        assert!(drain(&mut stream).is_empty());
        assert!(gate.stats().unlocked);

        gate.on_proposal(proposal(4));
        assert_eq!(drain(&mut stream), vec![4]);
        assert!(!gate.stats().unlocked);
    }

    #[test]
    fn test_locked_start_waits_for_first_commit() {
        let gate = locked_gate();
        let mut stream = gate.proposal_stream().unwrap();

        gate.on_proposal(proposal(1));
        gate.on_proposal(proposal(2));
        assert!(drain(&mut stream).is_empty());

        gate.on_commit();
        assert_eq!(drain(&mut stream), vec![1]);
    }

    #[test]
    fn test_repeated_commits_release_one_proposal() {
        let gate = locked_gate();
        let mut stream = gate.proposal_stream().unwrap();

        gate.on_commit();
        gate.on_commit();
        gate.on_commit();

        gate.on_proposal(proposal(1));
        gate.on_proposal(proposal(2));
        assert_eq!(drain(&mut stream), vec![1]);
        assert_eq!(gate.stats().buffered, 1);
    }

    #[test]
    fn test_stream_taken_once() {
        let gate = gate();
        assert!(gate.proposal_stream().is_some());
        assert!(gate.proposal_stream().is_none());
    }

    #[test]
    fn test_dropped_consumer_keeps_proposal_buffered() {
        let gate = gate();
        drop(gate.proposal_stream());

        gate.on_proposal(proposal(1));

        let stats = gate.stats();
        assert_eq!(stats.buffered, 1);
        assert_eq!(stats.proposals_released, 0);
    }

    #[test]
    fn test_stats_counts() {
        let gate = gate();
        let _stream = gate.proposal_stream();

        gate.on_proposal(proposal(1));
        gate.on_proposal(proposal(2));
        gate.on_commit();

        let stats = gate.stats();
        assert_eq!(stats.proposals_enqueued, 2);
        assert_eq!(stats.proposals_released, 2);
        assert_eq!(stats.commits_observed, 1);
        assert_eq!(stats.buffered, 0);
        assert!(!stats.unlocked);
    }

    #[test]
    fn test_propagate_transaction_forwards_unchanged() {
        let transport = Arc::new(RecordingTransport::default());
        let gate = OrderingGate::new(transport.clone());
        let tx = Arc::new(Transaction::new("alice@wonderland", 7));

        gate.propagate_transaction(Arc::clone(&tx)).unwrap();

        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(Arc::ptr_eq(&sent[0], &tx));
        assert_eq!(gate.stats().proposals_enqueued, 0);
    }

    #[test]
    fn test_propagate_transaction_surfaces_transport_error() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let gate = OrderingGate::new(transport);

        let result = gate.propagate_transaction(Arc::new(Transaction::new("bob@wonderland", 1)));
        assert!(matches!(result, Err(TransportError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_commit_link_unlocks_rounds() {
        let consensus = Arc::new(MockConsensus::default());
        let gate = Arc::new(gate());
        let mut stream = gate.proposal_stream().unwrap();

        gate.set_commit_link(&Arc::downgrade(&consensus)).unwrap();

        gate.on_proposal(proposal(1));
        gate.on_proposal(proposal(2));
        assert_eq!(stream.recv().await.map(|p| p.height), Some(1));

        consensus.bus.publish_now(LedgerEvent::BlockCommitted(Commit {
            height: 1,
            block_hash: [1u8; 32],
        }));

        let next = timeout(Duration::from_millis(200), stream.recv())
            .await
            .expect("timeout")
            .expect("proposal");
        assert_eq!(next.height, 2);
    }

    #[tokio::test]
    async fn test_set_commit_link_twice_fails() {
        let consensus = Arc::new(MockConsensus::default());
        let gate = Arc::new(gate());

        gate.set_commit_link(&Arc::downgrade(&consensus)).unwrap();
        assert_eq!(
            gate.set_commit_link(&Arc::downgrade(&consensus)),
            Err(CommitLinkError::AlreadyLinked)
        );
    }

    #[tokio::test]
    async fn test_set_commit_link_to_dropped_consensus_fails() {
        let consensus = Arc::new(MockConsensus::default());
        let weak = Arc::downgrade(&consensus);
        drop(consensus);

        let gate = Arc::new(gate());
        assert_eq!(
            gate.set_commit_link(&weak),
            Err(CommitLinkError::ConsensusGone)
        );
    }

    #[test]
    fn test_set_commit_link_without_runtime_fails() {
        let consensus = Arc::new(MockConsensus::default());
        let gate = Arc::new(gate());

        assert_eq!(
            gate.set_commit_link(&Arc::downgrade(&consensus)),
            Err(CommitLinkError::NoRuntime)
        );
    }
}
