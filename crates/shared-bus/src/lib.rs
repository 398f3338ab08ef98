//! # Shared Bus - Event Bus for Node Components
//!
//! Components never hold references to each other's internals: consensus
//! announces commits, block storage announces persisted blocks, and anyone
//! interested subscribes with a filter.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────────┐
//! │  Consensus   │ ────────────▶ │  Event Bus   │ ────────────▶ │ OrderingGate │
//! └──────────────┘               └──────────────┘               └──────────────┘
//! ```
//!
//! Delivery is broadcast: every live subscription sees every event published
//! after it was created. A subscriber that falls more than the channel
//! capacity behind skips the overwritten events.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
