use shared_types::{PermissionId, PublicKey, RoleId};

use crate::domain::{Account, AccountAsset, Asset, Domain, Peer, WsvError};

/// Read contract over committed world state.
///
/// Every lookup distinguishes three answers:
/// - `Ok(Some(_))`: found, fully populated.
/// - `Ok(None)`: the store answered and the entity does not exist.
/// - `Err(WsvError::Unavailable)`: the store could not be asked.
///
/// Answers reflect committed blocks only.
pub trait WsvQuery: Send + Sync {
    fn get_account(&self, account_id: &str) -> Result<Option<Account>, WsvError>;

    /// Value stored under `key` by `creator_account_id` in `account_id`'s
    /// details.
    fn get_account_detail(
        &self,
        account_id: &str,
        creator_account_id: &str,
        key: &str,
    ) -> Result<Option<String>, WsvError>;

    fn get_signatories(&self, account_id: &str) -> Result<Option<Vec<PublicKey>>, WsvError>;

    fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>, WsvError>;

    fn get_account_asset(
        &self,
        account_id: &str,
        asset_id: &str,
    ) -> Result<Option<AccountAsset>, WsvError>;

    fn get_domain(&self, domain_id: &str) -> Result<Option<Domain>, WsvError>;

    fn get_peers(&self) -> Result<Option<Vec<Peer>>, WsvError>;

    fn get_account_roles(&self, account_id: &str) -> Result<Option<Vec<RoleId>>, WsvError>;

    fn get_role_permissions(&self, role_name: &str)
        -> Result<Option<Vec<PermissionId>>, WsvError>;

    fn get_roles(&self) -> Result<Option<Vec<RoleId>>, WsvError>;

    /// Whether `permittee_account_id` holds `permission_id` over
    /// `account_id`.
    fn has_account_grantable_permission(
        &self,
        permittee_account_id: &str,
        account_id: &str,
        permission_id: &str,
    ) -> Result<bool, WsvError>;
}
