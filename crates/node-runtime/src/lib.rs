//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `container/` - configuration and subsystem construction
//! - `genesis/` - genesis block loading
//! - `keypair` - node identity
//! - `adapters/` - block store, consensus, and ordering service
//! - `wiring/` - links the ordering gate and starts subsystem tasks
//! - `runtime` - node lifecycle

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod keypair;
pub mod runtime;
pub mod wiring;

pub use container::{ConfigError, NodeConfig, SubsystemContainer};
pub use keypair::{KeypairError, NodeKeypair};
pub use runtime::NodeRuntime;
