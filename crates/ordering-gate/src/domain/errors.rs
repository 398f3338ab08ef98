//! Error types for the Ordering Gate

use thiserror::Error;

/// Failure to bind the gate to the consensus commit stream.
///
/// Always a wiring error: node startup must abort rather than run with a
/// gate that can never unlock past its first round.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitLinkError {
    /// The consensus engine was torn down before the link was made.
    #[error("Consensus engine is no longer alive")]
    ConsensusGone,

    /// The gate already subscribed to a commit stream.
    #[error("Commit link already established")]
    AlreadyLinked,

    /// The link needs a tokio runtime to drive its subscription.
    #[error("No async runtime available to drive the commit link")]
    NoRuntime,
}

/// Failure reported by the network transport.
///
/// The gate never handles these itself; they go back to the caller of
/// `propagate_transaction` unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The ordering service could not be reached.
    #[error("Ordering service unreachable: {0}")]
    Unreachable(String),

    /// The transport was shut down.
    #[error("Transport closed")]
    Closed,
}
