//! Entities returned by world-state lookups.

use serde::{Deserialize, Serialize};
use shared_types::{AccountId, AssetId, DomainId, PublicKey, RoleId};
use std::collections::BTreeMap;

/// Key/value details written into an account, grouped by the account that
/// wrote them.
pub type AccountDetails = BTreeMap<AccountId, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub domain_id: DomainId,
    /// Signatures required to authorize a transaction from this account.
    pub quorum: u32,
    pub details: AccountDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: AssetId,
    pub domain_id: DomainId,
    /// Decimal places of the asset's amounts.
    pub precision: u8,
}

/// An account's holding of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAsset {
    pub account_id: AccountId,
    pub asset_id: AssetId,
    /// Balance in the asset's smallest unit.
    pub balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub domain_id: DomainId,
    /// Role appended to every account created in this domain.
    pub default_role: RoleId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub address: String,
    pub peer_key: PublicKey,
}

/// Split `name@domain` / `name#domain` into its parts.
pub(crate) fn split_id(id: &str, separator: char) -> Option<(&str, &str)> {
    let (name, domain) = id.split_once(separator)?;
    if name.is_empty() || domain.is_empty() {
        return None;
    }
    Some((name, domain))
}
