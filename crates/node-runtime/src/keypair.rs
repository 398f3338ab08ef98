//! # Node Keypair
//!
//! The node's Ed25519 identity, stored as two hex files next to each other:
//! `<name>.pub` and `<name>.priv`.

use std::path::{Path, PathBuf};

use ed25519_dalek::SigningKey;
use shared_types::PublicKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeypairError {
    #[error("Cannot read key file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Key file {path} is not 32 hex-encoded bytes")]
    Malformed { path: PathBuf },

    #[error("Public key in {path} does not belong to the private key")]
    Mismatch { path: PathBuf },
}

/// A validated node keypair.
pub struct NodeKeypair {
    signing: SigningKey,
}

impl NodeKeypair {
    /// Load `<name>.pub` and `<name>.priv` and check that they match.
    pub fn load(name: &Path) -> Result<Self, KeypairError> {
        let pub_path = with_suffix(name, "pub");
        let priv_path = with_suffix(name, "priv");

        let public = read_key(&pub_path)?;
        let secret = read_key(&priv_path)?;

        let signing = SigningKey::from_bytes(&secret);
        if signing.verifying_key().to_bytes() != public {
            return Err(KeypairError::Mismatch { path: pub_path });
        }
        Ok(Self { signing })
    }

    pub fn public_key(&self) -> PublicKey {
        self.signing.verifying_key().to_bytes()
    }
}

impl std::fmt::Debug for NodeKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeKeypair")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

fn with_suffix(name: &Path, suffix: &str) -> PathBuf {
    let mut path = name.as_os_str().to_owned();
    path.push(".");
    path.push(suffix);
    PathBuf::from(path)
}

fn read_key(path: &Path) -> Result<[u8; 32], KeypairError> {
    let raw = std::fs::read_to_string(path).map_err(|source| KeypairError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = hex::decode(raw.trim()).map_err(|_| KeypairError::Malformed {
        path: path.to_path_buf(),
    })?;
    bytes.try_into().map_err(|_| KeypairError::Malformed {
        path: path.to_path_buf(),
    })
}
