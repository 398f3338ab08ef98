use shared_types::Block;

use crate::domain::WsvError;

/// Write side of the world state.
pub trait WsvCommand: Send + Sync {
    /// Apply a committed block. Either every command takes effect or none
    /// does.
    fn apply_block(&self, block: &Block) -> Result<(), WsvError>;
}
