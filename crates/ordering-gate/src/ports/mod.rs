//! Ports module for the Ordering Gate
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::OrderingGateApi;
pub use outbound::{CommitNotifier, OrderingGateTransport};
