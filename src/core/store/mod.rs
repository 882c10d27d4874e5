// ─── Entity Store ───
// Persistence seam for profiles, accounts and installed mods. Components
// only see the traits; `MemoryStore` is the bundled implementation.

pub mod memory;

use async_trait::async_trait;

use crate::core::auth::Account;
use crate::core::error::LauncherResult;
use crate::core::instance::Profile;
use crate::core::mods::InstalledMod;

pub use memory::MemoryStore;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: &str) -> LauncherResult<Option<Profile>>;
    async fn list_profiles(&self) -> LauncherResult<Vec<Profile>>;
    /// Insert or replace by id.
    async fn save_profile(&self, profile: &Profile) -> LauncherResult<()>;
    /// Also removes every mod record owned by the profile.
    async fn delete_profile(&self, id: &str) -> LauncherResult<bool>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, id: &str) -> LauncherResult<Option<Account>>;
    async fn list_accounts(&self) -> LauncherResult<Vec<Account>>;
    /// Insert or replace by id. Saving an active account deactivates the others.
    async fn save_account(&self, account: &Account) -> LauncherResult<()>;
    async fn delete_account(&self, id: &str) -> LauncherResult<bool>;
    async fn active_account(&self) -> LauncherResult<Option<Account>>;
    /// `NotFound` when no account has this id.
    async fn set_active_account(&self, id: &str) -> LauncherResult<()>;
}

#[async_trait]
pub trait ModStore: Send + Sync {
    async fn get_mod(&self, id: &str) -> LauncherResult<Option<InstalledMod>>;
    async fn mods_for_profile(&self, profile_id: &str) -> LauncherResult<Vec<InstalledMod>>;
    async fn find_mod(
        &self,
        profile_id: &str,
        registry_mod_id: &str,
    ) -> LauncherResult<Option<InstalledMod>>;
    /// `Conflict` when the profile already has a record for the same registry mod.
    async fn add_mod(&self, record: &InstalledMod) -> LauncherResult<()>;
    /// `NotFound` when the record does not exist.
    async fn update_mod(&self, record: &InstalledMod) -> LauncherResult<()>;
    async fn remove_mod(&self, id: &str) -> LauncherResult<bool>;

    async fn enabled_mods(&self, profile_id: &str) -> LauncherResult<Vec<InstalledMod>> {
        Ok(self
            .mods_for_profile(profile_id)
            .await?
            .into_iter()
            .filter(|m| m.enabled)
            .collect())
    }

    async fn mods_with_updates(&self, profile_id: &str) -> LauncherResult<Vec<InstalledMod>> {
        Ok(self
            .mods_for_profile(profile_id)
            .await?
            .into_iter()
            .filter(|m| m.has_update)
            .collect())
    }
}

/// Everything the launcher persists, behind one handle.
pub trait EntityStore: ProfileStore + AccountStore + ModStore {}

impl<T: ProfileStore + AccountStore + ModStore> EntityStore for T {}
