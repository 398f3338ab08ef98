use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shared_types::{hash_hex, Block, Hash, PermissionId, PublicKey, RoleId};
use tracing::{info, warn};

use crate::domain::{Account, AccountAsset, Asset, Domain, Peer, WorldState, WsvError};
use crate::ports::{WsvCommand, WsvQuery};

/// In-memory world state with copy-on-write block application.
///
/// Readers take the current snapshot and release the lock immediately. A
/// block is applied to a private clone which replaces the snapshot only if
/// every command succeeded.
pub struct InMemoryWorldState {
    current: RwLock<Arc<WorldState>>,
    /// Serializes writers so two blocks never start from the same base.
    writer: Mutex<()>,
    unavailable: AtomicBool,
}

impl InMemoryWorldState {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(WorldState::new())),
            writer: Mutex::new(()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate losing the connection to the store. While set, every query
    /// and every write fails with `WsvError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Current committed state.
    pub fn snapshot(&self) -> Result<Arc<WorldState>, WsvError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(WsvError::Unavailable("store connection lost".into()));
        }
        Ok(Arc::clone(&self.current.read()))
    }

    /// Height of the last applied block.
    pub fn height(&self) -> u64 {
        self.current.read().height()
    }

    /// Hash of the last applied block.
    pub fn top_hash(&self) -> Hash {
        self.current.read().top_hash()
    }
}

impl Default for InMemoryWorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WsvCommand for InMemoryWorldState {
    fn apply_block(&self, block: &Block) -> Result<(), WsvError> {
        let _writer = self.writer.lock();
        let base = self.snapshot()?;

        let mut next = WorldState::clone(&base);
        if let Err(e) = next.apply_block(block) {
            warn!(height = block.height, error = %e, "Block rejected by world state");
            return Err(e);
        }

        *self.current.write() = Arc::new(next);
        info!(
            height = block.height,
            hash = %hash_hex(&block.hash()),
            "World state advanced"
        );
        Ok(())
    }
}

impl WsvQuery for InMemoryWorldState {
    fn get_account(&self, account_id: &str) -> Result<Option<Account>, WsvError> {
        self.snapshot()?.get_account(account_id)
    }

    fn get_account_detail(
        &self,
        account_id: &str,
        creator_account_id: &str,
        key: &str,
    ) -> Result<Option<String>, WsvError> {
        self.snapshot()?
            .get_account_detail(account_id, creator_account_id, key)
    }

    fn get_signatories(&self, account_id: &str) -> Result<Option<Vec<PublicKey>>, WsvError> {
        self.snapshot()?.get_signatories(account_id)
    }

    fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>, WsvError> {
        self.snapshot()?.get_asset(asset_id)
    }

    fn get_account_asset(
        &self,
        account_id: &str,
        asset_id: &str,
    ) -> Result<Option<AccountAsset>, WsvError> {
        self.snapshot()?.get_account_asset(account_id, asset_id)
    }

    fn get_domain(&self, domain_id: &str) -> Result<Option<Domain>, WsvError> {
        self.snapshot()?.get_domain(domain_id)
    }

    fn get_peers(&self) -> Result<Option<Vec<Peer>>, WsvError> {
        self.snapshot()?.get_peers()
    }

    fn get_account_roles(&self, account_id: &str) -> Result<Option<Vec<RoleId>>, WsvError> {
        self.snapshot()?.get_account_roles(account_id)
    }

    fn get_role_permissions(
        &self,
        role_name: &str,
    ) -> Result<Option<Vec<PermissionId>>, WsvError> {
        self.snapshot()?.get_role_permissions(role_name)
    }

    fn get_roles(&self) -> Result<Option<Vec<RoleId>>, WsvError> {
        self.snapshot()?.get_roles()
    }

    fn has_account_grantable_permission(
        &self,
        permittee_account_id: &str,
        account_id: &str,
        permission_id: &str,
    ) -> Result<bool, WsvError> {
        self.snapshot()?
            .has_account_grantable_permission(permittee_account_id, account_id, permission_id)
    }
}
