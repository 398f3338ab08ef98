//! Shared fixtures: a config, genesis block and keypair in a temp directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ed25519_dalek::SigningKey;
use node_runtime::NodeConfig;
use shared_types::{Block, Command, Proposal, Transaction, ZERO_HASH};

pub const ADMIN: &str = "admin@test";
const SECRET: [u8; 32] = [42u8; 32];

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub config_path: PathBuf,
    pub genesis_path: PathBuf,
    pub keypair_name: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("config.json");
        let genesis_path = dir.path().join("genesis.block");
        let keypair_name = dir.path().join("node0");

        let config = NodeConfig {
            block_store_path: dir.path().join("block_store"),
            proposal_delay_ms: 20,
            vote_delay_ms: 0,
            ..Default::default()
        };
        std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        std::fs::write(&genesis_path, serde_json::to_string_pretty(&genesis()).unwrap()).unwrap();

        let signing = SigningKey::from_bytes(&SECRET);
        write_key(&keypair_name, "pub", &hex::encode(signing.verifying_key().to_bytes()));
        write_key(&keypair_name, "priv", &hex::encode(SECRET));

        Self {
            dir,
            config_path,
            genesis_path,
            keypair_name,
        }
    }

    /// Rewrite the config file with `edit` applied.
    pub fn edit_config(&self, edit: impl FnOnce(&mut NodeConfig)) {
        let raw = std::fs::read_to_string(&self.config_path).unwrap();
        let mut config: NodeConfig = serde_json::from_str(&raw).unwrap();
        edit(&mut config);
        std::fs::write(&self.config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    }

    pub fn block_store(&self) -> PathBuf {
        self.dir.path().join("block_store")
    }
}

fn write_key(name: &Path, suffix: &str, hex: &str) {
    let mut path = name.as_os_str().to_owned();
    path.push(".");
    path.push(suffix);
    std::fs::write(PathBuf::from(path), hex).unwrap();
}

pub fn genesis() -> Block {
    let tx = Transaction::new(ADMIN, 1)
        .with_command(Command::AddPeer {
            address: "127.0.0.1:10001".into(),
            peer_key: SigningKey::from_bytes(&SECRET).verifying_key().to_bytes(),
        })
        .with_command(Command::CreateRole {
            role_name: "user".into(),
            permissions: vec!["can_transfer".into(), "can_receive".into()],
        })
        .with_command(Command::CreateDomain {
            domain_id: "test".into(),
            default_role: "user".into(),
        })
        .with_command(Command::CreateAccount {
            account_name: "admin".into(),
            domain_id: "test".into(),
            public_key: [1u8; 32],
        })
        .with_command(Command::CreateAsset {
            asset_name: "coin".into(),
            domain_id: "test".into(),
            precision: 2,
        })
        .with_command(Command::AddAssetQuantity {
            account_id: ADMIN.into(),
            asset_id: "coin#test".into(),
            amount: 10_000,
        });
    Block::from_proposal(Proposal::new(1, vec![tx]), ZERO_HASH, 0)
}
