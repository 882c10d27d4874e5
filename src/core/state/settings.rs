// ─── Launcher Settings ───
// User-tunable configuration, persisted as `launcher_settings.json` in the data dir.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::auth::AuthEndpoints;
use crate::core::downloader::RetryPolicy;
use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "Craftline";
const SETTINGS_FILE: &str = "launcher_settings.json";
const STORE_FILE: &str = "launcher_store.json";

/// Upstream services. Every URL is overridable so tests and mirrors can redirect them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest: String,
    pub asset_objects: String,
    pub mod_registry: String,
    pub fabric_meta: String,
    pub fabric_maven: String,
    pub quilt_meta: String,
    pub quilt_maven: String,
    pub forge_promotions: String,
    pub neoforge_metadata: String,
    pub auth: AuthEndpoints,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: "https://launchermeta.mojang.com/mc/game/version_manifest.json".into(),
            asset_objects: "https://resources.download.minecraft.net".into(),
            mod_registry: "https://api.modrinth.com/v2".into(),
            fabric_meta: "https://meta.fabricmc.net/v2".into(),
            fabric_maven: "https://maven.fabricmc.net".into(),
            quilt_meta: "https://meta.quiltmc.org/v3".into(),
            quilt_maven: "https://maven.quiltmc.org/repository/release".into(),
            forge_promotions:
                "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json"
                    .into(),
            neoforge_metadata:
                "https://maven.neoforged.net/releases/net/neoforged/neoforge/maven-metadata.xml"
                    .into(),
            auth: AuthEndpoints::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub data_dir: PathBuf,
    /// Used when a profile does not pin its own runtime.
    pub java_path: PathBuf,
    pub window_width: u32,
    pub window_height: u32,
    pub fullscreen: bool,
    pub download_concurrency: usize,
    pub retry: RetryPolicy,
    pub endpoints: Endpoints,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            java_path: PathBuf::from("java"),
            window_width: 854,
            window_height: 480,
            fullscreen: false,
            download_concurrency: 8,
            retry: RetryPolicy::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl LauncherSettings {
    /// Settings rooted at `data_dir` with every other value defaulted.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn paths(&self) -> LauncherPaths {
        LauncherPaths::new(self.data_dir.clone())
    }

    /// Load `launcher_settings.json` from `data_dir`, falling back to defaults.
    /// A corrupt file is logged and ignored rather than blocking startup.
    pub async fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        let mut settings = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<LauncherSettings>(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable settings at {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        settings.data_dir = data_dir.to_path_buf();
        settings
    }

    pub async fn save(&self) -> LauncherResult<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| LauncherError::io(&self.data_dir, e))?;
        let path = self.data_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        info!("Saved launcher settings to {:?}", path);
        Ok(())
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// On-disk layout shared with existing installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    root: PathBuf,
}

impl LauncherPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_dir().join(version_id)
    }

    pub fn version_json(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{}.json", version_id))
    }

    pub fn version_jar(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id).join(format!("{}.jar", version_id))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index(&self, index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{}.json", index_id))
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.root.join("instances")
    }

    pub fn store_file(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_paths_follow_vanilla_layout() {
        let paths = LauncherPaths::new("/data");
        assert_eq!(
            paths.version_json("1.20.1"),
            PathBuf::from("/data/versions/1.20.1/1.20.1.json")
        );
        assert_eq!(
            paths.version_jar("1.20.1"),
            PathBuf::from("/data/versions/1.20.1/1.20.1.jar")
        );
        assert_eq!(
            paths.asset_index("5"),
            PathBuf::from("/data/assets/indexes/5.json")
        );
    }

    #[tokio::test]
    async fn settings_round_trip_through_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = LauncherSettings::with_data_dir(dir.path());
        settings.java_path = PathBuf::from("/opt/jdk/bin/java");
        settings.retry = RetryPolicy::new(1, 10);
        settings.save().await.unwrap();

        let loaded = LauncherSettings::load(dir.path()).await;
        assert_eq!(loaded.java_path, PathBuf::from("/opt/jdk/bin/java"));
        assert_eq!(loaded.retry, RetryPolicy::new(1, 10));
        assert_eq!(loaded.window_width, 854);
    }

    #[tokio::test]
    async fn missing_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = LauncherSettings::load(dir.path()).await;
        assert_eq!(loaded.data_dir, dir.path());
        assert_eq!(loaded.java_path, PathBuf::from("java"));
    }
}
