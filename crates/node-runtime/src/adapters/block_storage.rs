//! # Block Storage Adapter
//!
//! Flat-file block store: one JSON file per committed block, named by its
//! height zero-padded to 16 digits (`0000000000000001` is genesis).
//!
//! Blocks are appended strictly in height order. Each file is written to a
//! temporary name first and renamed into place, so a crash never leaves a
//! half-written block under a valid name.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use shared_types::Block;
use thiserror::Error;
use tracing::{debug, info};

const NAME_WIDTH: usize = 16;

#[derive(Debug, Error)]
pub enum BlockStoreError {
    #[error("Block store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored block {path} is malformed: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Block {got} does not follow stored height {height}")]
    OutOfOrder { height: u64, got: u64 },
}

pub struct FlatFileBlockStore {
    dir: PathBuf,
    /// Height of the last stored block, 0 when empty.
    height: Mutex<u64>,
}

impl FlatFileBlockStore {
    /// Open (creating if needed) the store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self, BlockStoreError> {
        std::fs::create_dir_all(dir).map_err(|source| BlockStoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut height = 0u64;
        let entries = std::fs::read_dir(dir).map_err(|source| BlockStoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| BlockStoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            if let Some(id) = parse_name(&entry.file_name().to_string_lossy()) {
                height = height.max(id);
            }
        }

        info!(path = %dir.display(), height, "Block store opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            height: Mutex::new(height),
        })
    }

    pub fn height(&self) -> u64 {
        *self.height.lock()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    /// Append `block`, which must sit directly on top of the stored chain.
    pub fn add(&self, block: &Block) -> Result<(), BlockStoreError> {
        let mut height = self.height.lock();
        if block.height != *height + 1 {
            return Err(BlockStoreError::OutOfOrder {
                height: *height,
                got: block.height,
            });
        }

        let path = self.path_for(block.height);
        let tmp = path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(block).map_err(|source| BlockStoreError::Codec {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&tmp, bytes).map_err(|source| BlockStoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| BlockStoreError::Io {
            path: path.clone(),
            source,
        })?;

        *height = block.height;
        debug!(height = block.height, path = %path.display(), "Block stored");
        Ok(())
    }

    /// Block at `height`, `None` if not stored.
    pub fn get(&self, height: u64) -> Result<Option<Block>, BlockStoreError> {
        if height == 0 || height > self.height() {
            return Ok(None);
        }
        let path = self.path_for(height);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BlockStoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| BlockStoreError::Codec { path, source })
    }

    /// Last stored block.
    pub fn top(&self) -> Result<Option<Block>, BlockStoreError> {
        self.get(self.height())
    }

    fn path_for(&self, height: u64) -> PathBuf {
        self.dir.join(format!("{height:0width$}", width = NAME_WIDTH))
    }
}

fn parse_name(name: &str) -> Option<u64> {
    if name.len() != NAME_WIDTH || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}
