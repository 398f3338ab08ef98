//! # Ledger Events
//!
//! Every event that flows through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Commit, Hash};

/// Events published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // CONSENSUS
    // =========================================================================
    /// Consensus closed a round and committed a block.
    /// The ordering gate unlocks the next proposal on this event.
    BlockCommitted(Commit),

    /// Consensus rejected the proposal for a round.
    ProposalRejected {
        /// Height the proposal was built for.
        height: u64,
        /// Reason for rejection.
        reason: String,
    },

    // =========================================================================
    // BLOCK STORAGE
    // =========================================================================
    /// A committed block was written to the block store.
    BlockStored {
        /// The stored block's height.
        height: u64,
        /// The stored block's hash.
        block_hash: Hash,
    },

    /// Genesis was applied to an empty ledger.
    GenesisInitialized {
        /// Hash of the genesis block.
        block_hash: Hash,
        /// Number of genesis transactions applied.
        transactions: usize,
    },

    // =========================================================================
    // CRITICAL EVENTS
    // =========================================================================
    /// Critical error requiring operator attention.
    CriticalError {
        /// Component that hit the error.
        source: String,
        /// Error description.
        error: String,
    },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockCommitted(_) | Self::ProposalRejected { .. } => EventTopic::Consensus,
            Self::BlockStored { .. } | Self::GenesisInitialized { .. } => EventTopic::BlockStorage,
            Self::CriticalError { .. } => EventTopic::Critical,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Consensus,
    BlockStorage,
    Critical,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
