use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

pub const DISABLED_SUFFIX: &str = ".disabled";

pub fn disabled_path(enabled_path: &Path) -> PathBuf {
    let mut name = enabled_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(DISABLED_SUFFIX);
    enabled_path.with_file_name(name)
}

/// Move a mod file between `<file>` and `<file>.disabled` with a single rename.
/// Already in the requested state is a no-op; a missing file is logged, not fatal.
pub async fn set_file_enabled(enabled_path: &Path, enabled: bool) -> LauncherResult<()> {
    let disabled = disabled_path(enabled_path);
    let (from, to) = if enabled {
        (disabled.as_path(), enabled_path)
    } else {
        (enabled_path, disabled.as_path())
    };

    if tokio::fs::try_exists(to).await.unwrap_or(false) {
        return Ok(());
    }

    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Cannot find mod file for renaming, skipping: {:?} -> {:?}", from, to);
            Ok(())
        }
        Err(e) => Err(LauncherError::io(from, e)),
    }
}

/// Delete both forms of a mod file. Returns how many existed.
pub async fn remove_mod_files(enabled_path: &Path) -> LauncherResult<usize> {
    let mut removed = 0;
    for path in [enabled_path.to_path_buf(), disabled_path(enabled_path)] {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(LauncherError::io(path, e)),
        }
    }
    Ok(removed)
}
