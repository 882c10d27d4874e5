use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{AccountStore, ModStore, ProfileStore};
use crate::core::auth::Account;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::Profile;
use crate::core::mods::InstalledMod;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct StoreData {
    profiles: Vec<Profile>,
    accounts: Vec<Account>,
    mods: Vec<InstalledMod>,
}

/// In-memory store, optionally mirrored to a JSON file after every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the snapshot at `path` (empty when absent) and keep writing it back.
    pub async fn open(path: impl Into<PathBuf>) -> LauncherResult<Self> {
        let path = path.into();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store snapshot at {:?}, starting empty", path);
                StoreData::default()
            }
            Err(e) => return Err(LauncherError::io(path, e)),
        };
        info!(
            "Store loaded: {} profiles, {} accounts, {} mods",
            data.profiles.len(),
            data.accounts.len(),
            data.mods.len()
        );
        Ok(Self {
            data: RwLock::new(data),
            path: Some(path),
        })
    }

    /// Called with the write lock held so snapshots land in mutation order.
    async fn persist(&self, data: &StoreData) -> LauncherResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_snapshot(path, data).await
    }
}

async fn write_snapshot(path: &Path, data: &StoreData) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    let temp = path.with_extension("json.tmp");
    tokio::fs::write(&temp, serde_json::to_vec_pretty(data)?)
        .await
        .map_err(|e| LauncherError::io(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| LauncherError::io(path, e))
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, id: &str) -> LauncherResult<Option<Profile>> {
        let data = self.data.read().await;
        Ok(data.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_profiles(&self) -> LauncherResult<Vec<Profile>> {
        Ok(self.data.read().await.profiles.clone())
    }

    async fn save_profile(&self, profile: &Profile) -> LauncherResult<()> {
        let mut data = self.data.write().await;
        match data.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => data.profiles.push(profile.clone()),
        }
        self.persist(&data).await
    }

    async fn delete_profile(&self, id: &str) -> LauncherResult<bool> {
        let mut data = self.data.write().await;
        let before = data.profiles.len();
        data.profiles.retain(|p| p.id != id);
        if data.profiles.len() == before {
            return Ok(false);
        }
        let mods_before = data.mods.len();
        data.mods.retain(|m| m.profile_id != id);
        debug!(
            "Profile {} deleted with {} mod records",
            id,
            mods_before - data.mods.len()
        );
        self.persist(&data).await?;
        Ok(true)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_account(&self, id: &str) -> LauncherResult<Option<Account>> {
        let data = self.data.read().await;
        Ok(data.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn list_accounts(&self) -> LauncherResult<Vec<Account>> {
        Ok(self.data.read().await.accounts.clone())
    }

    async fn save_account(&self, account: &Account) -> LauncherResult<()> {
        let mut data = self.data.write().await;
        if account.is_active {
            for other in data.accounts.iter_mut() {
                other.is_active = false;
            }
        }
        match data.accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => *existing = account.clone(),
            None => data.accounts.push(account.clone()),
        }
        self.persist(&data).await
    }

    async fn delete_account(&self, id: &str) -> LauncherResult<bool> {
        let mut data = self.data.write().await;
        let before = data.accounts.len();
        data.accounts.retain(|a| a.id != id);
        if data.accounts.len() == before {
            return Ok(false);
        }
        self.persist(&data).await?;
        Ok(true)
    }

    async fn active_account(&self) -> LauncherResult<Option<Account>> {
        let data = self.data.read().await;
        Ok(data.accounts.iter().find(|a| a.is_active).cloned())
    }

    async fn set_active_account(&self, id: &str) -> LauncherResult<()> {
        let mut data = self.data.write().await;
        if !data.accounts.iter().any(|a| a.id == id) {
            return Err(LauncherError::not_found("account", id));
        }
        for account in data.accounts.iter_mut() {
            account.is_active = account.id == id;
        }
        self.persist(&data).await
    }
}

#[async_trait]
impl ModStore for MemoryStore {
    async fn get_mod(&self, id: &str) -> LauncherResult<Option<InstalledMod>> {
        let data = self.data.read().await;
        Ok(data.mods.iter().find(|m| m.id == id).cloned())
    }

    async fn mods_for_profile(&self, profile_id: &str) -> LauncherResult<Vec<InstalledMod>> {
        let data = self.data.read().await;
        Ok(data
            .mods
            .iter()
            .filter(|m| m.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn find_mod(
        &self,
        profile_id: &str,
        registry_mod_id: &str,
    ) -> LauncherResult<Option<InstalledMod>> {
        let data = self.data.read().await;
        Ok(data
            .mods
            .iter()
            .find(|m| m.profile_id == profile_id && m.registry_mod_id == registry_mod_id)
            .cloned())
    }

    async fn add_mod(&self, record: &InstalledMod) -> LauncherResult<()> {
        let mut data = self.data.write().await;
        if data.mods.iter().any(|m| {
            m.id == record.id
                || (m.profile_id == record.profile_id
                    && m.registry_mod_id == record.registry_mod_id)
        }) {
            return Err(LauncherError::Conflict {
                kind: "mod",
                id: format!("{}/{}", record.profile_id, record.registry_mod_id),
            });
        }
        data.mods.push(record.clone());
        self.persist(&data).await
    }

    async fn update_mod(&self, record: &InstalledMod) -> LauncherResult<()> {
        let mut data = self.data.write().await;
        let Some(existing) = data.mods.iter_mut().find(|m| m.id == record.id) else {
            return Err(LauncherError::not_found("mod", &record.id));
        };
        *existing = record.clone();
        self.persist(&data).await
    }

    async fn remove_mod(&self, id: &str) -> LauncherResult<bool> {
        let mut data = self.data.write().await;
        let before = data.mods.len();
        data.mods.retain(|m| m.id != id);
        if data.mods.len() == before {
            warn!("Mod record {} was already gone", id);
            return Ok(false);
        }
        self.persist(&data).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mods::ModPlatform;

    fn record(profile: &str, registry: &str) -> InstalledMod {
        InstalledMod::new(profile, registry, "Sodium", "0.5.3", "v1", "sodium.jar", ModPlatform::Modrinth)
    }

    #[tokio::test]
    async fn only_one_account_is_active() {
        let store = MemoryStore::new();
        let mut a = Account::offline("Alex");
        a.is_active = true;
        let mut b = Account::offline("Steve");
        b.is_active = true;
        store.save_account(&a).await.unwrap();
        store.save_account(&b).await.unwrap();

        assert_eq!(store.active_account().await.unwrap().unwrap().id, b.id);
        store.set_active_account(&a.id).await.unwrap();
        let accounts = store.list_accounts().await.unwrap();
        assert_eq!(accounts.iter().filter(|x| x.is_active).count(), 1);
        assert_eq!(store.active_account().await.unwrap().unwrap().id, a.id);

        assert!(matches!(
            store.set_active_account("missing").await,
            Err(LauncherError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_mod_per_profile_conflicts() {
        let store = MemoryStore::new();
        store.add_mod(&record("p1", "AANobbMI")).await.unwrap();
        assert!(matches!(
            store.add_mod(&record("p1", "AANobbMI")).await,
            Err(LauncherError::Conflict { .. })
        ));
        // Same mod in another profile is fine.
        store.add_mod(&record("p2", "AANobbMI")).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_profile_cascades_to_mods() {
        let store = MemoryStore::new();
        let profile = Profile::new("Survival", "1.20.1");
        store.save_profile(&profile).await.unwrap();
        store.add_mod(&record(&profile.id, "AANobbMI")).await.unwrap();
        store.add_mod(&record("other", "AANobbMI")).await.unwrap();

        assert!(store.delete_profile(&profile.id).await.unwrap());
        assert!(store.mods_for_profile(&profile.id).await.unwrap().is_empty());
        assert_eq!(store.mods_for_profile("other").await.unwrap().len(), 1);
        assert!(!store.delete_profile(&profile.id).await.unwrap());
    }

    #[tokio::test]
    async fn enabled_and_update_filters() {
        let store = MemoryStore::new();
        let mut off = record("p", "a");
        off.enabled = false;
        let mut stale = record("p", "b");
        stale.has_update = true;
        store.add_mod(&off).await.unwrap();
        store.add_mod(&stale).await.unwrap();

        let enabled = store.enabled_mods("p").await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].registry_mod_id, "b");
        assert_eq!(store.mods_with_updates("p").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher_store.json");

        let store = MemoryStore::open(&path).await.unwrap();
        let profile = Profile::new("Creative", "1.20.4");
        store.save_profile(&profile).await.unwrap();
        drop(store);

        let reopened = MemoryStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_profile(&profile.id).await.unwrap(), Some(profile));
        assert!(!dir.path().join("launcher_store.json.tmp").exists());
    }
}
