//! Domain module for the Ordering Gate
//!
//! The two pieces of shared state the release protocol works on, and the
//! errors the gate can report.

pub mod buffer;
pub mod errors;
pub mod release;

pub use buffer::{ProposalBuffer, ReleaseOutcome};
pub use errors::*;
pub use release::ReleaseGate;
