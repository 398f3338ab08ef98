//! Domain module for the world state.

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::*;
pub use errors::*;
pub use state::WorldState;
