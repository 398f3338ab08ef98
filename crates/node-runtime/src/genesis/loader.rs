use std::path::{Path, PathBuf};

use shared_types::{hash_hex, Block, ZERO_HASH};
use thiserror::Error;
use tracing::info;

/// Genesis block loading errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Cannot read genesis block {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed genesis block {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid genesis block: {0}")]
    Invalid(String),
}

/// Read the genesis block from `path` and check its shape.
pub fn load_genesis(path: &Path) -> Result<Block, GenesisError> {
    let raw = std::fs::read_to_string(path).map_err(|source| GenesisError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let block: Block = serde_json::from_str(&raw).map_err(|source| GenesisError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    check_genesis(&block)?;

    info!(
        hash = %hash_hex(&block.hash()),
        transactions = block.transactions.len(),
        "Genesis block loaded"
    );
    Ok(block)
}

fn check_genesis(block: &Block) -> Result<(), GenesisError> {
    if block.height != 1 {
        return Err(GenesisError::Invalid(format!(
            "height must be 1, got {}",
            block.height
        )));
    }
    if block.prev_hash != ZERO_HASH {
        return Err(GenesisError::Invalid("prev_hash must be all zeros".into()));
    }
    if block.transactions.is_empty() {
        return Err(GenesisError::Invalid("no transactions".into()));
    }
    Ok(())
}
