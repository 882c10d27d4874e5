use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

/// Directories the game expects inside a profile's working directory.
pub const WORKSPACE_SUBDIRS: [&str; 5] = ["saves", "resourcepacks", "shaderpacks", "screenshots", "mods"];

/// Filesystem view of one profile: `instances/<id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDirs {
    root: PathBuf,
}

impl ProfileDirs {
    pub fn new(instances_dir: &Path, profile_id: &str) -> Self {
        Self {
            root: instances_dir.join(profile_id),
        }
    }

    /// Game working directory (`--gameDir`).
    pub fn game_dir(&self) -> &Path {
        &self.root
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.root.join("mods")
    }

    /// Native libraries extracted before each launch.
    pub fn natives_dir(&self) -> PathBuf {
        self.root.join("natives")
    }

    /// Create the working tree. Safe to call on every launch.
    pub async fn materialize(&self) -> LauncherResult<()> {
        let [saves, resourcepacks, shaderpacks, screenshots, mods] =
            WORKSPACE_SUBDIRS.map(|sub| self.root.join(sub));

        tokio::try_join!(
            create_dir_safe(&saves),
            create_dir_safe(&resourcepacks),
            create_dir_safe(&shaderpacks),
            create_dir_safe(&screenshots),
            create_dir_safe(&mods),
        )?;

        debug!("Workspace ready at {:?}", self.root);
        Ok(())
    }

    /// Remove the whole working directory. Returns false if it never existed.
    pub async fn remove(&self) -> LauncherResult<bool> {
        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            return Ok(false);
        }
        tokio::fs::remove_dir_all(&self.root)
            .await
            .map_err(|e| LauncherError::io(&self.root, e))?;
        info!("Deleted profile directory {:?}", self.root);
        Ok(true)
    }
}

async fn create_dir_safe(path: &Path) -> LauncherResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn materialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = ProfileDirs::new(dir.path(), "p1");

        dirs.materialize().await.unwrap();
        dirs.materialize().await.unwrap();

        for sub in WORKSPACE_SUBDIRS {
            assert!(dir.path().join("p1").join(sub).is_dir(), "{sub} missing");
        }
        assert_eq!(dirs.mods_dir(), dir.path().join("p1/mods"));
    }

    #[tokio::test]
    async fn remove_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = ProfileDirs::new(dir.path(), "ghost");
        assert!(!dirs.remove().await.unwrap());

        dirs.materialize().await.unwrap();
        assert!(dirs.remove().await.unwrap());
        assert!(!dir.path().join("ghost").exists());
    }
}
