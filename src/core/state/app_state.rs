// ─── Application State ───
// Wires the launcher components around one data directory, one fetch client
// and one entity store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use super::settings::{LauncherPaths, LauncherSettings};
use crate::core::auth::{Account, ChainState, FederationChain, InteractiveLogin};
use crate::core::downloader::FetchClient;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::{LoaderType, Profile, ProfileDirs};
use crate::core::launch::{LaunchDefaults, LaunchOrchestrator};
use crate::core::loaders::{list_loader_versions, LoaderVersion};
use crate::core::modrinth::RegistryClient;
use crate::core::mods::ModManager;
use crate::core::store::{EntityStore, MemoryStore};
use crate::core::version::VersionInstaller;

pub struct AppState {
    pub settings: LauncherSettings,
    pub paths: LauncherPaths,
    pub fetch: Arc<FetchClient>,
    pub store: Arc<dyn EntityStore>,
    pub versions: VersionInstaller,
    pub registry: Arc<RegistryClient>,
    pub mods: ModManager,
    pub launcher: LaunchOrchestrator,
    auth: Mutex<FederationChain>,
}

impl AppState {
    /// Build every component from `settings`, loading the store snapshot from
    /// the data directory.
    pub async fn new(
        settings: LauncherSettings,
        login: Arc<dyn InteractiveLogin>,
    ) -> LauncherResult<Self> {
        let paths = settings.paths();
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::open(paths.store_file()).await?);
        Self::with_store(settings, login, store)
    }

    /// Same wiring with a caller-supplied store.
    pub fn with_store(
        settings: LauncherSettings,
        login: Arc<dyn InteractiveLogin>,
        store: Arc<dyn EntityStore>,
    ) -> LauncherResult<Self> {
        let paths = settings.paths();
        let endpoints = settings.endpoints.clone();
        let fetch = Arc::new(
            FetchClient::new(settings.retry.clone())?
                .with_concurrency(settings.download_concurrency),
        );

        let versions = VersionInstaller::new(fetch.clone(), paths.clone(), endpoints.clone());
        let registry = Arc::new(RegistryClient::new(fetch.clone(), endpoints.mod_registry.clone()));
        let mods = ModManager::new(
            registry.clone(),
            fetch.clone(),
            store.clone(),
            paths.instances_dir(),
        );
        let launcher = LaunchOrchestrator::new(
            store.clone(),
            fetch.clone(),
            paths.clone(),
            LaunchDefaults {
                java_path: settings.java_path.clone(),
                window: (settings.window_width, settings.window_height),
                fullscreen: settings.fullscreen,
                asset_objects_url: endpoints.asset_objects.clone(),
            },
        );
        let auth = Mutex::new(FederationChain::new(fetch.clone(), endpoints.auth, login));

        info!("Launcher state ready at {:?}", paths.root());
        Ok(Self {
            settings,
            paths,
            fetch,
            store,
            versions,
            registry,
            mods,
            launcher,
            auth,
        })
    }

    // ── Accounts ────────────────────────────────────────

    /// Interactive sign-in. The new account becomes the active one.
    pub async fn sign_in(&self) -> LauncherResult<Account> {
        let mut account = self.auth.lock().await.authenticate().await?;
        account.is_active = true;
        self.store.save_account(&account).await?;
        Ok(account)
    }

    /// Offline accounts skip the chain entirely.
    pub async fn add_offline_account(&self, username: &str) -> LauncherResult<Account> {
        let mut account = Account::offline(username);
        account.is_active = self.store.active_account().await?.is_none();
        self.store.save_account(&account).await?;
        info!("Added offline account {}", account.username);
        Ok(account)
    }

    /// Silent refresh of a stored account. The stored record keeps its id.
    pub async fn refresh_account(&self, account_id: &str) -> LauncherResult<Account> {
        let account = self.require_account(account_id).await?;
        let refreshed = self.auth.lock().await.refresh(&account).await?;
        self.store.save_account(&refreshed).await?;
        Ok(refreshed)
    }

    /// Forget the session and drop the account record.
    pub async fn sign_out(&self, account_id: &str) -> LauncherResult<()> {
        let account = self.require_account(account_id).await?;
        self.auth.lock().await.sign_out(&account).await?;
        self.store.delete_account(account_id).await?;
        Ok(())
    }

    pub async fn auth_state(&self) -> ChainState {
        self.auth.lock().await.state().clone()
    }

    pub async fn set_active_account(&self, account_id: &str) -> LauncherResult<()> {
        self.store.set_active_account(account_id).await
    }

    pub async fn remove_account(&self, account_id: &str) -> LauncherResult<bool> {
        self.store.delete_account(account_id).await
    }

    pub async fn list_accounts(&self) -> LauncherResult<Vec<Account>> {
        self.store.list_accounts().await
    }

    async fn require_account(&self, account_id: &str) -> LauncherResult<Account> {
        self.store
            .get_account(account_id)
            .await?
            .ok_or_else(|| LauncherError::not_found("account", account_id))
    }

    // ── Profiles ────────────────────────────────────────

    /// Persist the profile and lay out its working directory.
    pub async fn create_profile(&self, profile: Profile) -> LauncherResult<Profile> {
        ProfileDirs::new(&self.paths.instances_dir(), &profile.id)
            .materialize()
            .await?;
        self.store.save_profile(&profile).await?;
        info!("Created profile {} ({})", profile.name, profile.id);
        Ok(profile)
    }

    pub async fn list_profiles(&self) -> LauncherResult<Vec<Profile>> {
        self.store.list_profiles().await
    }

    /// Removes the record, its mod records and the working directory.
    pub async fn delete_profile(&self, profile_id: &str) -> LauncherResult<bool> {
        let existed = self.store.delete_profile(profile_id).await?;
        if existed {
            ProfileDirs::new(&self.paths.instances_dir(), profile_id)
                .remove()
                .await?;
            info!("Deleted profile {}", profile_id);
        }
        Ok(existed)
    }

    // ── Loaders ─────────────────────────────────────────

    pub async fn list_loader_versions(
        &self,
        loader: LoaderType,
        game_version: &str,
    ) -> LauncherResult<Vec<LoaderVersion>> {
        list_loader_versions(&self.fetch, &self.settings.endpoints, loader, game_version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::IdentityGrant;
    use async_trait::async_trait;

    struct NoLogin;

    #[async_trait]
    impl InteractiveLogin for NoLogin {
        async fn login(&self) -> LauncherResult<IdentityGrant> {
            Err(LauncherError::Other("no interactive login in tests".into()))
        }

        async fn acquire_silent(&self, _: &str) -> LauncherResult<Option<IdentityGrant>> {
            Ok(None)
        }

        async fn forget(&self, _: &str) -> LauncherResult<()> {
            Ok(())
        }
    }

    async fn state(dir: &std::path::Path) -> AppState {
        AppState::new(LauncherSettings::with_data_dir(dir), Arc::new(NoLogin))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_offline_account_becomes_active() {
        let dir = tempfile::tempdir().unwrap();
        let app = state(dir.path()).await;

        let first = app.add_offline_account("Steve").await.unwrap();
        let second = app.add_offline_account("Alex").await.unwrap();
        assert!(first.is_active);
        assert!(!second.is_active);

        app.set_active_account(&second.id).await.unwrap();
        let active = app.store.active_account().await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        assert!(app.remove_account(&first.id).await.unwrap());
        assert!(!app.remove_account(&first.id).await.unwrap());
        assert_eq!(app.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn profile_lifecycle_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let app = state(dir.path()).await;

        let profile = app
            .create_profile(Profile::new("Survival", "1.20.1"))
            .await
            .unwrap();
        let game_dir = dir.path().join("instances").join(&profile.id);
        assert!(game_dir.join("mods").is_dir());
        assert_eq!(app.list_profiles().await.unwrap().len(), 1);

        assert!(app.delete_profile(&profile.id).await.unwrap());
        assert!(!game_dir.exists());
        assert!(!app.delete_profile(&profile.id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_sign_in_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let app = state(dir.path()).await;

        assert!(app.sign_in().await.is_err());
        assert!(app.list_accounts().await.unwrap().is_empty());
        assert!(matches!(app.auth_state().await, ChainState::Failed { .. }));
    }
}
