use shared_types::{AccountId, AssetId};
use thiserror::Error;

/// Errors surfaced by world-state ports.
///
/// A missing account, asset or detail is not an error; lookups answer it with
/// `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WsvError {
    /// The store cannot be reached. Callers treat this as the collaborator
    /// being down, not as an empty answer.
    #[error("World state unavailable: {0}")]
    Unavailable(String),

    #[error("Block {got} does not follow ledger height {height}")]
    HeightMismatch { height: u64, got: u64 },

    #[error("Command {index} of transaction {tx_counter} from {creator} failed: {source}")]
    CommandFailed {
        creator: AccountId,
        tx_counter: u64,
        index: usize,
        #[source]
        source: CommandError,
    },
}

/// Why a single command could not be applied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Malformed identifier: {0}")]
    MalformedId(String),

    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Domain already exists: {0}")]
    DomainExists(String),

    #[error("Account already exists: {0}")]
    AccountExists(AccountId),

    #[error("Asset already exists: {0}")]
    AssetExists(AssetId),

    #[error("Role already exists: {0}")]
    RoleExists(String),

    #[error("Peer already exists: {0}")]
    PeerExists(String),

    #[error("Signatory already attached to {0}")]
    SignatoryExists(AccountId),

    #[error("Insufficient balance: {account_id} holds {balance} of {asset_id}, needs {amount}")]
    InsufficientBalance {
        account_id: AccountId,
        asset_id: AssetId,
        balance: u128,
        amount: u128,
    },

    #[error("Balance overflow for {account_id} in {asset_id}")]
    BalanceOverflow {
        account_id: AccountId,
        asset_id: AssetId,
    },
}
