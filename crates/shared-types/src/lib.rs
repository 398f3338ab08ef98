//! # Shared Types Crate
//!
//! Ledger entities that cross crate boundaries inside the node.
//!
//! ## Clusters
//!
//! - **Requests**: `Transaction`, `Command`
//! - **Rounds**: `Proposal`, `Block`, `Commit`
//! - **Identifiers**: account, asset, domain and role ids are plain strings
//!   (`alice@wonderland`, `coin#wonderland`), keys are raw 32-byte arrays.

pub mod entities;
pub mod serde_helpers;

pub use entities::*;
