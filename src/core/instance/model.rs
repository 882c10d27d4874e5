use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Supported mod loaders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    Fabric,
    Quilt,
    Forge,
    NeoForge,
}

impl LoaderType {
    /// Identifier used by loader metadata and the mod registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderType::Fabric => "fabric",
            LoaderType::Quilt => "quilt",
            LoaderType::Forge => "forge",
            LoaderType::NeoForge => "neoforge",
        }
    }
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-configured game installation.
///
/// Its working directory lives under `instances/<id>/` and holds `saves/`,
/// `resourcepacks/`, `shaderpacks/`, `screenshots/` and `mods/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub version_id: String,
    pub loader: Option<LoaderType>,
    pub loader_version: Option<String>,
    pub memory_min_mb: u32,
    pub memory_max_mb: u32,
    #[serde(default)]
    pub custom_jvm_args: Vec<String>,
    #[serde(default)]
    pub custom_game_args: Vec<String>,
    /// Overrides the launcher-wide Java executable.
    pub java_path: Option<PathBuf>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
    /// `None` follows the launcher-wide setting.
    #[serde(default)]
    pub fullscreen: Option<bool>,

    // ── Internal state ──
    pub created_at: DateTime<Utc>,
    pub last_played: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(name: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            version_id: version_id.into(),
            loader: None,
            loader_version: None,
            memory_min_mb: 512,
            memory_max_mb: 2048,
            custom_jvm_args: Vec::new(),
            custom_game_args: Vec::new(),
            java_path: None,
            window_width: None,
            window_height: None,
            fullscreen: None,
            created_at: Utc::now(),
            last_played: None,
        }
    }

    pub fn with_loader(mut self, loader: LoaderType, loader_version: impl Into<String>) -> Self {
        self.loader = Some(loader);
        self.loader_version = Some(loader_version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_uses_default_memory_bounds() {
        let profile = Profile::new("Survival", "1.20.1");
        assert_eq!(profile.memory_min_mb, 512);
        assert_eq!(profile.memory_max_mb, 2048);
        assert!(profile.loader.is_none());
        assert!(profile.last_played.is_none());
    }

    #[test]
    fn loader_serializes_lowercase() {
        let profile = Profile::new("Modded", "1.20.1").with_loader(LoaderType::NeoForge, "20.4.80");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["loader"], "neoforge");
        assert_eq!(json["versionId"], "1.20.1");
    }
}
