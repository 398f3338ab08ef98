//! # Core Ledger Entities
//!
//! Transactions carry an ordered list of commands against the world state.
//! The ordering service batches transactions into proposals, consensus turns
//! an accepted proposal into a block, and the commit of that block is
//! announced to the rest of the node as a `Commit`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Account identifier, `name@domain`.
pub type AccountId = String;

/// Asset identifier, `name#domain`.
pub type AssetId = String;

/// Domain identifier.
pub type DomainId = String;

/// Role identifier.
pub type RoleId = String;

/// Permission identifier, e.g. `can_transfer`.
pub type PermissionId = String;

/// Hash of a block with no parent.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Hex rendering of a hash for logs.
#[must_use]
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

// =============================================================================
// CLUSTER A: REQUESTS
// =============================================================================

/// A single world-state mutation carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Register a peer of the network.
    AddPeer {
        address: String,
        #[serde(with = "crate::serde_helpers::hex_fixed")]
        peer_key: PublicKey,
    },
    /// Define a role with its permission set.
    CreateRole {
        role_name: RoleId,
        permissions: Vec<PermissionId>,
    },
    /// Create a domain whose new accounts receive `default_role`.
    CreateDomain {
        domain_id: DomainId,
        default_role: RoleId,
    },
    /// Create `account_name@domain_id` with a single signatory.
    CreateAccount {
        account_name: String,
        domain_id: DomainId,
        #[serde(with = "crate::serde_helpers::hex_fixed")]
        public_key: PublicKey,
    },
    /// Create `asset_name#domain_id`.
    CreateAsset {
        asset_name: String,
        domain_id: DomainId,
        precision: u8,
    },
    /// Attach a role to an account.
    AppendRole { account_id: AccountId, role_name: RoleId },
    /// Add a signatory key to an account.
    AddSignatory {
        account_id: AccountId,
        #[serde(with = "crate::serde_helpers::hex_fixed")]
        public_key: PublicKey,
    },
    /// Mint `amount` of an asset into an account.
    AddAssetQuantity {
        account_id: AccountId,
        asset_id: AssetId,
        #[serde(with = "crate::serde_helpers::u128_decimal")]
        amount: u128,
    },
    /// Move `amount` of an asset between accounts.
    TransferAsset {
        src_account_id: AccountId,
        dest_account_id: AccountId,
        asset_id: AssetId,
        #[serde(with = "crate::serde_helpers::u128_decimal")]
        amount: u128,
    },
    /// Write a key/value detail into an account, namespaced by the writer.
    SetAccountDetail {
        account_id: AccountId,
        key: String,
        value: String,
    },
    /// Grant a grantable permission over the creator's account.
    GrantPermission {
        account_id: AccountId,
        permission_name: PermissionId,
    },
}

impl Command {
    /// Feed a canonical encoding of the command into `hasher`.
    fn digest_into(&self, hasher: &mut Sha256) {
        fn field(hasher: &mut Sha256, bytes: &[u8]) {
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        }

        match self {
            Self::AddPeer { address, peer_key } => {
                hasher.update([0u8]);
                field(hasher, address.as_bytes());
                field(hasher, peer_key);
            }
            Self::CreateRole {
                role_name,
                permissions,
            } => {
                hasher.update([1u8]);
                field(hasher, role_name.as_bytes());
                for permission in permissions {
                    field(hasher, permission.as_bytes());
                }
            }
            Self::CreateDomain {
                domain_id,
                default_role,
            } => {
                hasher.update([2u8]);
                field(hasher, domain_id.as_bytes());
                field(hasher, default_role.as_bytes());
            }
            Self::CreateAccount {
                account_name,
                domain_id,
                public_key,
            } => {
                hasher.update([3u8]);
                field(hasher, account_name.as_bytes());
                field(hasher, domain_id.as_bytes());
                field(hasher, public_key);
            }
            Self::CreateAsset {
                asset_name,
                domain_id,
                precision,
            } => {
                hasher.update([4u8]);
                field(hasher, asset_name.as_bytes());
                field(hasher, domain_id.as_bytes());
                hasher.update([*precision]);
            }
            Self::AppendRole {
                account_id,
                role_name,
            } => {
                hasher.update([5u8]);
                field(hasher, account_id.as_bytes());
                field(hasher, role_name.as_bytes());
            }
            Self::AddSignatory {
                account_id,
                public_key,
            } => {
                hasher.update([6u8]);
                field(hasher, account_id.as_bytes());
                field(hasher, public_key);
            }
            Self::AddAssetQuantity {
                account_id,
                asset_id,
                amount,
            } => {
                hasher.update([7u8]);
                field(hasher, account_id.as_bytes());
                field(hasher, asset_id.as_bytes());
                hasher.update(amount.to_be_bytes());
            }
            Self::TransferAsset {
                src_account_id,
                dest_account_id,
                asset_id,
                amount,
            } => {
                hasher.update([8u8]);
                field(hasher, src_account_id.as_bytes());
                field(hasher, dest_account_id.as_bytes());
                field(hasher, asset_id.as_bytes());
                hasher.update(amount.to_be_bytes());
            }
            Self::SetAccountDetail {
                account_id,
                key,
                value,
            } => {
                hasher.update([9u8]);
                field(hasher, account_id.as_bytes());
                field(hasher, key.as_bytes());
                field(hasher, value.as_bytes());
            }
            Self::GrantPermission {
                account_id,
                permission_name,
            } => {
                hasher.update([10u8]);
                field(hasher, account_id.as_bytes());
                field(hasher, permission_name.as_bytes());
            }
        }
    }
}

/// A client request as submitted to the node.
///
/// Identified by its creator and the per-account counter the client assigns
/// monotonically. Transactions are never mutated once built; stages share
/// them behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Account that created and signed the transaction.
    pub creator_account_id: AccountId,
    /// Per-account sequence number.
    pub tx_counter: u64,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_ts: u64,
    /// Commands applied in order when the transaction is committed.
    pub commands: Vec<Command>,
}

impl Transaction {
    pub fn new(creator_account_id: impl Into<AccountId>, tx_counter: u64) -> Self {
        Self {
            creator_account_id: creator_account_id.into(),
            tx_counter,
            created_ts: 0,
            commands: Vec::new(),
        }
    }

    pub fn with_created_ts(mut self, created_ts: u64) -> Self {
        self.created_ts = created_ts;
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Content hash of the transaction.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        self.digest_into(&mut hasher);
        hasher.finalize().into()
    }

    fn digest_into(&self, hasher: &mut Sha256) {
        hasher.update((self.creator_account_id.len() as u64).to_be_bytes());
        hasher.update(self.creator_account_id.as_bytes());
        hasher.update(self.tx_counter.to_be_bytes());
        hasher.update(self.created_ts.to_be_bytes());
        hasher.update((self.commands.len() as u64).to_be_bytes());
        for command in &self.commands {
            command.digest_into(hasher);
        }
    }
}

// =============================================================================
// CLUSTER B: ROUNDS
// =============================================================================

/// An ordered batch of transactions assembled for one consensus round.
///
/// Identity is positional: the round `height` the ordering service built it
/// for, not its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Height of the block this proposal would become.
    pub height: u64,
    /// Transactions in the order they will be applied.
    pub transactions: Vec<Transaction>,
}

impl Proposal {
    pub fn new(height: u64, transactions: Vec<Transaction>) -> Self {
        Self {
            height,
            transactions,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// A committed (or genesis) block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Height in the chain; genesis is 1.
    pub height: u64,
    /// Hash of the previous block, `ZERO_HASH` for genesis.
    #[serde(with = "crate::serde_helpers::hex_fixed")]
    pub prev_hash: Hash,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_ts: u64,
    /// Transactions applied by this block.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Build the block that commits `proposal` on top of `prev_hash`.
    pub fn from_proposal(proposal: Proposal, prev_hash: Hash, created_ts: u64) -> Self {
        Self {
            height: proposal.height,
            prev_hash,
            created_ts,
            transactions: proposal.transactions,
        }
    }

    /// Content hash of the block.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.prev_hash);
        hasher.update(self.created_ts.to_be_bytes());
        hasher.update((self.transactions.len() as u64).to_be_bytes());
        for tx in &self.transactions {
            tx.digest_into(&mut hasher);
        }
        hasher.finalize().into()
    }
}

/// Notification that consensus closed a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Height of the committed block.
    pub height: u64,
    /// Hash of the committed block.
    #[serde(with = "crate::serde_helpers::hex_fixed")]
    pub block_hash: Hash,
}

impl From<&Block> for Commit {
    fn from(block: &Block) -> Self {
        Self {
            height: block.height,
            block_hash: block.hash(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_tx(counter: u64) -> Transaction {
        Transaction::new("alice@wonderland", counter).with_command(Command::TransferAsset {
            src_account_id: "alice@wonderland".into(),
            dest_account_id: "bob@wonderland".into(),
            asset_id: "coin#wonderland".into(),
            amount: 10,
        })
    }

    #[test]
    fn test_transaction_hash_depends_on_counter() {
        assert_eq!(transfer_tx(1).hash(), transfer_tx(1).hash());
        assert_ne!(transfer_tx(1).hash(), transfer_tx(2).hash());
    }

    #[test]
    fn test_transaction_hash_depends_on_commands() {
        let plain = Transaction::new("alice@wonderland", 1);
        assert_ne!(plain.hash(), transfer_tx(1).hash());
    }

    #[test]
    fn test_block_from_proposal_keeps_height_and_order() {
        let proposal = Proposal::new(7, vec![transfer_tx(1), transfer_tx(2)]);
        let block = Block::from_proposal(proposal, ZERO_HASH, 42);

        assert_eq!(block.height, 7);
        assert_eq!(block.transactions[0].tx_counter, 1);
        assert_eq!(block.transactions[1].tx_counter, 2);
    }

    #[test]
    fn test_block_hash_links_to_parent() {
        let a = Block::from_proposal(Proposal::new(2, vec![]), ZERO_HASH, 0);
        let b = Block::from_proposal(Proposal::new(2, vec![]), [1u8; 32], 0);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_commit_from_block() {
        let block = Block::from_proposal(Proposal::new(3, vec![transfer_tx(5)]), ZERO_HASH, 9);
        let commit = Commit::from(&block);
        assert_eq!(commit.height, 3);
        assert_eq!(commit.block_hash, block.hash());
    }

    #[test]
    fn test_command_json_is_tagged() {
        let cmd = Command::CreateDomain {
            domain_id: "wonderland".into(),
            default_role: "user".into(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "create_domain");

        let back: Command = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_asset_commands_survive_json_text() {
        let block = Block::from_proposal(
            Proposal::new(
                2,
                vec![transfer_tx(1).with_command(Command::AddAssetQuantity {
                    account_id: "alice@wonderland".into(),
                    asset_id: "coin#wonderland".into(),
                    amount: 10_000,
                })],
            ),
            ZERO_HASH,
            0,
        );

        let text = serde_json::to_string(&block).unwrap();
        assert!(text.contains(r#""amount":"10000""#));

        let back: Block = serde_json::from_str(&text).unwrap();
        assert_eq!(back.hash(), block.hash());
        assert_eq!(back.transactions, block.transactions);
    }

    #[test]
    fn test_hash_hex() {
        assert_eq!(hash_hex(&ZERO_HASH).len(), 64);
    }
}
