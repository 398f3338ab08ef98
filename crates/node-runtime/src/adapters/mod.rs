//! # Adapter Implementations
//!
//! Concrete implementations of the ordering gate's outbound ports plus the
//! node's storage:
//!
//! - `LoopbackOrderingService`: `OrderingGateTransport`, builds proposals
//! - `ConsensusAdapter`: `CommitNotifier`, consumes released proposals
//! - `FlatFileBlockStore`: committed blocks on disk

pub mod block_storage;
pub mod consensus;
pub mod transaction_ordering;

pub use block_storage::{BlockStoreError, FlatFileBlockStore};
pub use consensus::ConsensusAdapter;
pub use transaction_ordering::LoopbackOrderingService;
