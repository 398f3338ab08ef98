//! # Consensus Adapter
//!
//! Single-peer consensus: every proposal the gate releases is validated
//! against the world state, turned into a block, applied, stored, and
//! announced with `LedgerEvent::BlockCommitted`. That announcement is what
//! unlocks the gate for the next round.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ordering_gate::{CommitNotifier, ProposalStream};
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, LedgerEvent, Subscription};
use shared_types::{hash_hex, Block, Commit, Proposal, Transaction};
use tokio::sync::watch;
use tracing::{error, info, warn};
use world_state::{InMemoryWorldState, WorldState, WsvCommand};

use crate::adapters::FlatFileBlockStore;

pub struct ConsensusAdapter {
    bus: Arc<InMemoryEventBus>,
    world_state: Arc<InMemoryWorldState>,
    block_store: Arc<FlatFileBlockStore>,
    vote_delay: Duration,
}

impl ConsensusAdapter {
    pub fn new(
        bus: Arc<InMemoryEventBus>,
        world_state: Arc<InMemoryWorldState>,
        block_store: Arc<FlatFileBlockStore>,
        vote_delay: Duration,
    ) -> Self {
        Self {
            bus,
            world_state,
            block_store,
            vote_delay,
        }
    }

    /// Consume released proposals until the stream ends or shutdown is
    /// signalled.
    pub async fn run(
        self: Arc<Self>,
        mut proposals: ProposalStream,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                next = proposals.recv() => match next {
                    Some(proposal) => {
                        tokio::time::sleep(self.vote_delay).await;
                        self.vote(proposal);
                    }
                    None => {
                        info!("[consensus] Proposal stream closed");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    info!("[consensus] Shutdown signal received");
                    break;
                }
            }
        }
    }

    /// Close the round for `proposal`. Returns the commit on success.
    pub fn vote(&self, proposal: Proposal) -> Option<Commit> {
        let height = proposal.height;
        let expected = self.world_state.height() + 1;
        if height != expected {
            warn!(height, expected, "[consensus] Proposal does not extend the chain");
            self.bus.publish_now(LedgerEvent::ProposalRejected {
                height,
                reason: format!("expected height {expected}"),
            });
            return None;
        }

        let block = match self.validate(proposal) {
            Ok(block) => block,
            Err(e) => {
                self.critical(e);
                return None;
            }
        };

        // Disk first: world state never runs ahead of the stored chain.
        if let Err(e) = self.block_store.add(&block) {
            self.critical(e.to_string());
            return None;
        }
        if let Err(e) = self.world_state.apply_block(&block) {
            self.critical(e.to_string());
            return None;
        }
        let commit = Commit::from(&block);
        self.bus.publish_now(LedgerEvent::BlockStored {
            height: commit.height,
            block_hash: commit.block_hash,
        });

        info!(
            height = commit.height,
            hash = %hash_hex(&commit.block_hash),
            transactions = block.transactions.len(),
            "[consensus] Block committed"
        );
        self.bus.publish_now(LedgerEvent::BlockCommitted(commit));
        Some(commit)
    }

    /// Stateful validation: keep the transactions that apply cleanly on top
    /// of the current state, in proposal order.
    fn validate(&self, proposal: Proposal) -> Result<Block, String> {
        let snapshot = self.world_state.snapshot().map_err(|e| e.to_string())?;
        let mut scratch = WorldState::clone(&snapshot);
        let height = proposal.height;

        let accepted: Vec<Transaction> = proposal
            .transactions
            .into_iter()
            .filter(|tx| {
                let mut attempt = scratch.clone();
                match attempt.apply_transaction(tx) {
                    Ok(()) => {
                        scratch = attempt;
                        true
                    }
                    Err(e) => {
                        warn!(
                            height,
                            tx_counter = tx.tx_counter,
                            account_id = %tx.creator_account_id,
                            error = %e,
                            "[consensus] Dropping transaction"
                        );
                        false
                    }
                }
            })
            .collect();

        Ok(Block::from_proposal(
            Proposal::new(height, accepted),
            snapshot.top_hash(),
            now_millis(),
        ))
    }

    fn critical(&self, error: String) {
        error!(error = %error, "[consensus] Round failed");
        self.bus.publish_now(LedgerEvent::CriticalError {
            source: "consensus".into(),
            error,
        });
    }
}

impl CommitNotifier for ConsensusAdapter {
    fn on_commit(&self) -> Subscription {
        self.bus
            .subscribe(EventFilter::topics(vec![EventTopic::Consensus]))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Command, ZERO_HASH};
    use world_state::WsvQuery;

    fn genesis() -> Block {
        let tx = Transaction::new("admin@test", 1)
            .with_command(Command::CreateRole {
                role_name: "user".into(),
                permissions: vec![],
            })
            .with_command(Command::CreateDomain {
                domain_id: "test".into(),
                default_role: "user".into(),
            })
            .with_command(Command::CreateAccount {
                account_name: "admin".into(),
                domain_id: "test".into(),
                public_key: [1u8; 32],
            });
        Block::from_proposal(Proposal::new(1, vec![tx]), ZERO_HASH, 0)
    }

    fn adapter(dir: &std::path::Path) -> ConsensusAdapter {
        let world_state = Arc::new(InMemoryWorldState::new());
        let block_store = Arc::new(FlatFileBlockStore::open(dir).unwrap());
        world_state.apply_block(&genesis()).unwrap();
        block_store.add(&genesis()).unwrap();
        ConsensusAdapter::new(
            Arc::new(InMemoryEventBus::new()),
            world_state,
            block_store,
            Duration::ZERO,
        )
    }

    fn create_account(counter: u64, name: &str) -> Transaction {
        Transaction::new("admin@test", counter).with_command(Command::CreateAccount {
            account_name: name.into(),
            domain_id: "test".into(),
            public_key: [counter as u8; 32],
        })
    }

    #[test]
    fn test_vote_commits_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let consensus = adapter(dir.path());
        let mut commits = consensus.on_commit();

        let commit = consensus
            .vote(Proposal::new(2, vec![create_account(2, "bob")]))
            .expect("committed");

        assert_eq!(commit.height, 2);
        assert_eq!(consensus.block_store.height(), 2);
        assert_eq!(consensus.world_state.height(), 2);
        assert!(matches!(
            commits.try_recv(),
            Ok(Some(LedgerEvent::BlockCommitted(c))) if c == commit
        ));
    }

    #[test]
    fn test_invalid_transactions_are_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let consensus = adapter(dir.path());

        // Second creation of bob conflicts with the first within the proposal.
        consensus
            .vote(Proposal::new(
                2,
                vec![create_account(2, "bob"), create_account(3, "bob")],
            ))
            .expect("committed");

        let stored = consensus.block_store.get(2).unwrap().unwrap();
        assert_eq!(stored.transactions.len(), 1);
        assert_eq!(stored.transactions[0].tx_counter, 2);
        assert_eq!(stored.prev_hash, genesis().hash());
    }

    #[test]
    fn test_failed_store_write_leaves_world_state_behind() {
        let dir = tempfile::tempdir().unwrap();
        let consensus = adapter(dir.path());
        let mut events = consensus.bus.subscribe(EventFilter::all());

        // Height 2 is already taken on disk, so the write is refused.
        consensus
            .block_store
            .add(&Block::from_proposal(Proposal::new(2, vec![]), genesis().hash(), 0))
            .unwrap();

        assert!(consensus
            .vote(Proposal::new(2, vec![create_account(2, "bob")]))
            .is_none());
        assert_eq!(consensus.world_state.height(), 1);
        assert_eq!(consensus.world_state.get_account("bob@test").unwrap(), None);
        assert!(matches!(
            events.try_recv(),
            Ok(Some(LedgerEvent::CriticalError { .. }))
        ));
    }

    #[test]
    fn test_stale_proposal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let consensus = adapter(dir.path());
        let mut events = consensus
            .bus
            .subscribe(EventFilter::all());

        assert!(consensus.vote(Proposal::new(5, vec![])).is_none());
        assert!(matches!(
            events.try_recv(),
            Ok(Some(LedgerEvent::ProposalRejected { height: 5, .. }))
        ));
        assert_eq!(consensus.world_state.height(), 1);
    }
}
