//! # Genesis Module
//!
//! Loading and checking the genesis block passed with `--genesis_block`.
//!
//! The genesis block is an ordinary `Block` in JSON with two fixed
//! properties: height 1 and an all-zero parent hash. It is applied to the
//! world state and written to the block store only when the store is empty.

pub mod loader;

pub use loader::{load_genesis, GenesisError};
