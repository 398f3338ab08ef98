//! # Ordering Gate
//!
//! Releases proposals from the ordering service to consensus strictly one
//! round at a time.
//!
//! Proposals arrive from the network whenever the ordering service finishes
//! a batch; commits arrive from consensus whenever a round closes. Both paths
//! run the same release protocol against a FIFO buffer and a single release
//! token, so at most one proposal is in flight per round no matter which
//! thread gets there first.
//!
//! ## Architecture
//!
//! - **Domain**: `ProposalBuffer` (FIFO holding area), `ReleaseGate` (token)
//! - **Ports**: Inbound (`OrderingGateApi`) and Outbound
//!   (`OrderingGateTransport`, `CommitNotifier`)
//! - **Application**: `OrderingGate` (release protocol), `CommitLink`
//!   (revocable commit subscription), `ProposalStream` (outbound channel)
//!
//! ## Startup contract
//!
//! The token starts unlocked by default (`OrderingGateConfig::start_unlocked`),
//! so the first proposal of the node's lifetime is released without waiting
//! for a commit. Every later release needs one commit.

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::commit_link::CommitLink;
pub use application::service::{GateStats, OrderingGate};
pub use application::stream::ProposalStream;
pub use config::OrderingGateConfig;
pub use domain::buffer::{ProposalBuffer, ReleaseOutcome};
pub use domain::errors::{CommitLinkError, TransportError};
pub use domain::release::ReleaseGate;
pub use ports::inbound::OrderingGateApi;
pub use ports::outbound::{CommitNotifier, OrderingGateTransport};
