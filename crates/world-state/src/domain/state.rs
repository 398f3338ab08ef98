//! # World State
//!
//! The full set of committed ledger facts at one height. `WorldState` is a
//! plain value: applying a block mutates it in place, so callers that need
//! all-or-nothing semantics apply to a clone and swap it in on success.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use shared_types::{
    hash_hex, AccountId, AssetId, Block, Command, DomainId, Hash, PermissionId, PublicKey,
    RoleId, Transaction, ZERO_HASH,
};
use tracing::{debug, info};

use super::entities::{split_id, Account, AccountAsset, Asset, Domain, Peer};
use super::errors::{CommandError, WsvError};
use crate::ports::WsvQuery;

/// Committed ledger state.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    height: u64,
    top_hash: Hash,
    peers: Vec<Peer>,
    roles: BTreeMap<RoleId, BTreeSet<PermissionId>>,
    domains: BTreeMap<DomainId, Domain>,
    accounts: BTreeMap<AccountId, Account>,
    signatories: BTreeMap<AccountId, Vec<PublicKey>>,
    account_roles: BTreeMap<AccountId, BTreeSet<RoleId>>,
    assets: BTreeMap<AssetId, Asset>,
    account_assets: BTreeMap<(AccountId, AssetId), AccountAsset>,
    /// `(permittee, account, permission)` triples.
    grantable: BTreeSet<(AccountId, AccountId, PermissionId)>,
}

impl WorldState {
    /// Empty state, before genesis.
    pub fn new() -> Self {
        Self {
            top_hash: ZERO_HASH,
            ..Default::default()
        }
    }

    /// Height of the last applied block, 0 before genesis.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Hash of the last applied block.
    pub fn top_hash(&self) -> Hash {
        self.top_hash
    }

    /// Apply every command of `block` in order.
    ///
    /// On error `self` may be partially modified; see `InMemoryWorldState`
    /// for the atomic wrapper.
    pub fn apply_block(&mut self, block: &Block) -> Result<(), WsvError> {
        if block.height != self.height + 1 {
            return Err(WsvError::HeightMismatch {
                height: self.height,
                got: block.height,
            });
        }

        for tx in &block.transactions {
            self.apply_transaction(tx)?;
        }

        self.height = block.height;
        self.top_hash = block.hash();
        debug!(
            height = self.height,
            hash = %hash_hex(&self.top_hash),
            transactions = block.transactions.len(),
            "Block applied to world state"
        );
        Ok(())
    }

    /// Apply the commands of one transaction in order, without touching the
    /// height. Used by block application and by stateful validation of
    /// proposals.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<(), WsvError> {
        for (index, command) in tx.commands.iter().enumerate() {
            self.apply_command(&tx.creator_account_id, command)
                .map_err(|source| WsvError::CommandFailed {
                    creator: tx.creator_account_id.clone(),
                    tx_counter: tx.tx_counter,
                    index,
                    source,
                })?;
        }
        Ok(())
    }

    fn apply_command(&mut self, creator: &str, command: &Command) -> Result<(), CommandError> {
        match command {
            Command::AddPeer { address, peer_key } => {
                if self
                    .peers
                    .iter()
                    .any(|p| p.address == *address || p.peer_key == *peer_key)
                {
                    return Err(CommandError::PeerExists(address.clone()));
                }
                self.peers.push(Peer {
                    address: address.clone(),
                    peer_key: *peer_key,
                });
            }

            Command::CreateRole {
                role_name,
                permissions,
            } => match self.roles.entry(role_name.clone()) {
                Entry::Occupied(_) => return Err(CommandError::RoleExists(role_name.clone())),
                Entry::Vacant(slot) => {
                    slot.insert(permissions.iter().cloned().collect());
                }
            },

            Command::CreateDomain {
                domain_id,
                default_role,
            } => {
                if !self.roles.contains_key(default_role) {
                    return Err(CommandError::RoleNotFound(default_role.clone()));
                }
                match self.domains.entry(domain_id.clone()) {
                    Entry::Occupied(_) => {
                        return Err(CommandError::DomainExists(domain_id.clone()))
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(Domain {
                            domain_id: domain_id.clone(),
                            default_role: default_role.clone(),
                        });
                    }
                }
            }

            Command::CreateAccount {
                account_name,
                domain_id,
                public_key,
            } => {
                let default_role = self
                    .domains
                    .get(domain_id)
                    .map(|d| d.default_role.clone())
                    .ok_or_else(|| CommandError::DomainNotFound(domain_id.clone()))?;
                let account_id = format!("{account_name}@{domain_id}");
                if account_name.is_empty() || account_name.contains(['@', '#']) {
                    return Err(CommandError::MalformedId(account_id));
                }
                if self.accounts.contains_key(&account_id) {
                    return Err(CommandError::AccountExists(account_id));
                }
                self.accounts.insert(
                    account_id.clone(),
                    Account {
                        account_id: account_id.clone(),
                        domain_id: domain_id.clone(),
                        quorum: 1,
                        details: BTreeMap::new(),
                    },
                );
                self.signatories
                    .insert(account_id.clone(), vec![*public_key]);
                self.account_roles
                    .insert(account_id, BTreeSet::from([default_role]));
            }

            Command::CreateAsset {
                asset_name,
                domain_id,
                precision,
            } => {
                if !self.domains.contains_key(domain_id) {
                    return Err(CommandError::DomainNotFound(domain_id.clone()));
                }
                let asset_id = format!("{asset_name}#{domain_id}");
                if asset_name.is_empty() || asset_name.contains(['@', '#']) {
                    return Err(CommandError::MalformedId(asset_id));
                }
                if self.assets.contains_key(&asset_id) {
                    return Err(CommandError::AssetExists(asset_id));
                }
                self.assets.insert(
                    asset_id.clone(),
                    Asset {
                        asset_id,
                        domain_id: domain_id.clone(),
                        precision: *precision,
                    },
                );
            }

            Command::AppendRole {
                account_id,
                role_name,
            } => {
                if !self.roles.contains_key(role_name) {
                    return Err(CommandError::RoleNotFound(role_name.clone()));
                }
                self.account_roles
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::AccountNotFound(account_id.clone()))?
                    .insert(role_name.clone());
            }

            Command::AddSignatory {
                account_id,
                public_key,
            } => {
                let keys = self
                    .signatories
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::AccountNotFound(account_id.clone()))?;
                if keys.contains(public_key) {
                    return Err(CommandError::SignatoryExists(account_id.clone()));
                }
                keys.push(*public_key);
            }

            Command::AddAssetQuantity {
                account_id,
                asset_id,
                amount,
            } => {
                self.require_account(account_id)?;
                self.require_asset(asset_id)?;
                let holding = self.holding_mut(account_id, asset_id);
                holding.balance = holding.balance.checked_add(*amount).ok_or_else(|| {
                    CommandError::BalanceOverflow {
                        account_id: account_id.clone(),
                        asset_id: asset_id.clone(),
                    }
                })?;
            }

            Command::TransferAsset {
                src_account_id,
                dest_account_id,
                asset_id,
                amount,
            } => {
                self.require_account(src_account_id)?;
                self.require_account(dest_account_id)?;
                self.require_asset(asset_id)?;

                let balance = self
                    .account_assets
                    .get(&(src_account_id.clone(), asset_id.clone()))
                    .map_or(0, |h| h.balance);
                if balance < *amount {
                    return Err(CommandError::InsufficientBalance {
                        account_id: src_account_id.clone(),
                        asset_id: asset_id.clone(),
                        balance,
                        amount: *amount,
                    });
                }
                let dest_balance = self
                    .account_assets
                    .get(&(dest_account_id.clone(), asset_id.clone()))
                    .map_or(0, |h| h.balance);
                if src_account_id != dest_account_id && dest_balance.checked_add(*amount).is_none()
                {
                    return Err(CommandError::BalanceOverflow {
                        account_id: dest_account_id.clone(),
                        asset_id: asset_id.clone(),
                    });
                }

                self.holding_mut(src_account_id, asset_id).balance -= *amount;
                self.holding_mut(dest_account_id, asset_id).balance += *amount;
            }

            Command::SetAccountDetail {
                account_id,
                key,
                value,
            } => {
                self.accounts
                    .get_mut(account_id)
                    .ok_or_else(|| CommandError::AccountNotFound(account_id.clone()))?
                    .details
                    .entry(creator.to_string())
                    .or_default()
                    .insert(key.clone(), value.clone());
            }

            Command::GrantPermission {
                account_id,
                permission_name,
            } => {
                self.require_account(account_id)?;
                self.grantable.insert((
                    account_id.clone(),
                    creator.to_string(),
                    permission_name.clone(),
                ));
            }
        }
        Ok(())
    }

    fn require_account(&self, account_id: &str) -> Result<(), CommandError> {
        if split_id(account_id, '@').is_none() {
            return Err(CommandError::MalformedId(account_id.to_string()));
        }
        if !self.accounts.contains_key(account_id) {
            return Err(CommandError::AccountNotFound(account_id.to_string()));
        }
        Ok(())
    }

    fn require_asset(&self, asset_id: &str) -> Result<(), CommandError> {
        if split_id(asset_id, '#').is_none() {
            return Err(CommandError::MalformedId(asset_id.to_string()));
        }
        if !self.assets.contains_key(asset_id) {
            return Err(CommandError::AssetNotFound(asset_id.to_string()));
        }
        Ok(())
    }

    fn holding_mut(&mut self, account_id: &str, asset_id: &str) -> &mut AccountAsset {
        self.account_assets
            .entry((account_id.to_string(), asset_id.to_string()))
            .or_insert_with(|| AccountAsset {
                account_id: account_id.to_string(),
                asset_id: asset_id.to_string(),
                balance: 0,
            })
    }

    fn account_exists(&self, account_id: &str) -> bool {
        if self.accounts.contains_key(account_id) {
            return true;
        }
        info!("Account {} not found", account_id);
        false
    }
}

impl WsvQuery for WorldState {
    fn get_account(&self, account_id: &str) -> Result<Option<Account>, WsvError> {
        let account = self.accounts.get(account_id).cloned();
        if account.is_none() {
            info!("Account {} not found", account_id);
        }
        Ok(account)
    }

    fn get_account_detail(
        &self,
        account_id: &str,
        creator_account_id: &str,
        key: &str,
    ) -> Result<Option<String>, WsvError> {
        let Some(account) = self.accounts.get(account_id) else {
            info!("Account {} not found", account_id);
            return Ok(None);
        };
        Ok(account
            .details
            .get(creator_account_id)
            .and_then(|written| written.get(key))
            .cloned())
    }

    fn get_signatories(&self, account_id: &str) -> Result<Option<Vec<PublicKey>>, WsvError> {
        if !self.account_exists(account_id) {
            return Ok(None);
        }
        Ok(Some(
            self.signatories.get(account_id).cloned().unwrap_or_default(),
        ))
    }

    fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>, WsvError> {
        let asset = self.assets.get(asset_id).cloned();
        if asset.is_none() {
            info!("Asset {} not found", asset_id);
        }
        Ok(asset)
    }

    fn get_account_asset(
        &self,
        account_id: &str,
        asset_id: &str,
    ) -> Result<Option<AccountAsset>, WsvError> {
        let holding = self
            .account_assets
            .get(&(account_id.to_string(), asset_id.to_string()))
            .cloned();
        if holding.is_none() {
            info!("Account {} does not have asset {}", account_id, asset_id);
        }
        Ok(holding)
    }

    fn get_domain(&self, domain_id: &str) -> Result<Option<Domain>, WsvError> {
        let domain = self.domains.get(domain_id).cloned();
        if domain.is_none() {
            info!("Domain {} not found", domain_id);
        }
        Ok(domain)
    }

    fn get_peers(&self) -> Result<Option<Vec<Peer>>, WsvError> {
        Ok(Some(self.peers.clone()))
    }

    fn get_account_roles(&self, account_id: &str) -> Result<Option<Vec<RoleId>>, WsvError> {
        if !self.account_exists(account_id) {
            return Ok(None);
        }
        Ok(Some(
            self.account_roles
                .get(account_id)
                .map(|roles| roles.iter().cloned().collect())
                .unwrap_or_default(),
        ))
    }

    fn get_role_permissions(
        &self,
        role_name: &str,
    ) -> Result<Option<Vec<PermissionId>>, WsvError> {
        let permissions = self
            .roles
            .get(role_name)
            .map(|set| set.iter().cloned().collect());
        if permissions.is_none() {
            info!("Role {} not found", role_name);
        }
        Ok(permissions)
    }

    fn get_roles(&self) -> Result<Option<Vec<RoleId>>, WsvError> {
        Ok(Some(self.roles.keys().cloned().collect()))
    }

    fn has_account_grantable_permission(
        &self,
        permittee_account_id: &str,
        account_id: &str,
        permission_id: &str,
    ) -> Result<bool, WsvError> {
        Ok(self.grantable.contains(&(
            permittee_account_id.to_string(),
            account_id.to_string(),
            permission_id.to_string(),
        )))
    }
}
