//! Ports module for the world state.

pub mod command;
pub mod query;

pub use command::WsvCommand;
pub use query::WsvQuery;
