//! # world-state
//!
//! The committed world state of the ledger: domains, accounts, assets,
//! roles, signatories, permissions and peers.
//!
//! ## Role in System
//!
//! - **Read contract** (`WsvQuery`): point-in-time lookups used by
//!   transaction validation. "Not found" is an ordinary answer (`Ok(None)`),
//!   never an error and never a half-filled object.
//! - **Write side** (`WsvCommand`): applies committed blocks, all or nothing.
//!   Readers never observe a block that is only partly applied, nor anything
//!   from a proposal that has not been committed.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::InMemoryWorldState;
pub use domain::*;
pub use ports::*;
