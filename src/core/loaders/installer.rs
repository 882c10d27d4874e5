use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::LoaderType;

use super::{context::InstallContext, fabric::FabricInstaller};

/// What a loader adds on top of the vanilla version. Persisted as the
/// install marker, so launching never needs the loader's network APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderInstallResult {
    pub loader: LoaderType,
    pub loader_version: String,
    pub main_class: String,
    #[serde(default)]
    pub extra_jvm_args: Vec<String>,
    #[serde(default)]
    pub extra_game_args: Vec<String>,
    /// Paths relative to the shared library directory, `/`-separated.
    #[serde(default)]
    pub libraries: Vec<String>,
}

#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult>;
}

/// Enum dispatch over the installable loaders.
pub enum Installer {
    Fabric(FabricInstaller),
    Quilt(FabricInstaller),
}

impl Installer {
    /// Forge-family loaders need their installer processors, which this core does not run.
    pub fn new(loader: LoaderType) -> LauncherResult<Self> {
        match loader {
            LoaderType::Fabric => Ok(Self::Fabric(FabricInstaller::fabric())),
            LoaderType::Quilt => Ok(Self::Quilt(FabricInstaller::quilt())),
            LoaderType::Forge | LoaderType::NeoForge => Err(LauncherError::NotImplemented(
                format!("{} installation", loader),
            )),
        }
    }

    pub async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult> {
        match self {
            Installer::Fabric(i) | Installer::Quilt(i) => i.install(ctx).await,
        }
    }
}

/// `versions/<id>/loaders/<loader>-<version>.json`
pub fn marker_path(version_dir: &Path, loader: LoaderType, loader_version: &str) -> PathBuf {
    version_dir
        .join("loaders")
        .join(format!("{}-{}.json", loader, loader_version))
}

pub async fn read_marker(
    version_dir: &Path,
    loader: LoaderType,
    loader_version: &str,
) -> LauncherResult<Option<LoaderInstallResult>> {
    let path = marker_path(version_dir, loader, loader_version);
    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LauncherError::io(path, e)),
    }
}

/// Temp file + rename, so a half-written marker never counts as installed.
pub async fn write_marker(version_dir: &Path, result: &LoaderInstallResult) -> LauncherResult<()> {
    let path = marker_path(version_dir, result.loader, &result.loader_version);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    let temp = path.with_extension("json.tmp");
    tokio::fs::write(&temp, serde_json::to_vec_pretty(result)?)
        .await
        .map_err(|e| LauncherError::io(&temp, e))?;
    tokio::fs::rename(&temp, &path)
        .await
        .map_err(|e| LauncherError::io(&path, e))?;
    info!("Recorded {} {} install", result.loader, result.loader_version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_family_is_not_implemented() {
        assert!(matches!(
            Installer::new(LoaderType::Forge),
            Err(LauncherError::NotImplemented(_))
        ));
        assert!(matches!(
            Installer::new(LoaderType::NeoForge),
            Err(LauncherError::NotImplemented(_))
        ));
        assert!(Installer::new(LoaderType::Quilt).is_ok());
    }

    #[tokio::test]
    async fn marker_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_marker(dir.path(), LoaderType::Fabric, "0.15.7")
            .await
            .unwrap()
            .is_none());

        let result = LoaderInstallResult {
            loader: LoaderType::Fabric,
            loader_version: "0.15.7".into(),
            main_class: "net.fabricmc.loader.impl.launch.knot.KnotClient".into(),
            extra_jvm_args: vec![],
            extra_game_args: vec![],
            libraries: vec!["net/fabricmc/fabric-loader/0.15.7/fabric-loader-0.15.7.jar".into()],
        };
        write_marker(dir.path(), &result).await.unwrap();

        let loaded = read_marker(dir.path(), LoaderType::Fabric, "0.15.7")
            .await
            .unwrap();
        assert_eq!(loaded, Some(result));
        assert!(dir.path().join("loaders/fabric-0.15.7.json").exists());
    }
}
