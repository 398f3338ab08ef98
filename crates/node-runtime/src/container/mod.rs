//! # Subsystem Container
//!
//! Holds every component of the running node and builds them in dependency
//! order: storage and world state first, then the event bus, consensus, the
//! ordering service, and finally the ordering gate.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::SubsystemContainer;
