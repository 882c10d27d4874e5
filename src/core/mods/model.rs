use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModPlatform {
    Modrinth,
    CurseForge,
}

impl std::fmt::Display for ModPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ModPlatform::Modrinth => "modrinth",
            ModPlatform::CurseForge => "curseforge",
        })
    }
}

/// A mod file placed in a profile's `mods/` directory.
///
/// At most one record exists per `(profile_id, registry_mod_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledMod {
    pub id: String,
    pub profile_id: String,
    pub registry_mod_id: String,
    pub name: String,
    pub version: String,
    pub version_id: String,
    /// Enabled file name; a disabled mod lives at `<file_name>.disabled`.
    pub file_name: String,
    pub enabled: bool,
    pub platform: ModPlatform,
    pub latest_version: Option<String>,
    #[serde(default)]
    pub has_update: bool,
    pub installed_at: DateTime<Utc>,
}

impl InstalledMod {
    pub fn new(
        profile_id: impl Into<String>,
        registry_mod_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        version_id: impl Into<String>,
        file_name: impl Into<String>,
        platform: ModPlatform,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            profile_id: profile_id.into(),
            registry_mod_id: registry_mod_id.into(),
            name: name.into(),
            version: version.into(),
            version_id: version_id.into(),
            file_name: file_name.into(),
            enabled: true,
            platform,
            latest_version: None,
            has_update: false,
            installed_at: Utc::now(),
        }
    }
}

/// One search result, flattened for display.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModSummary {
    pub registry_mod_id: String,
    pub slug: Option<String>,
    pub name: String,
    pub description: String,
    pub author: Option<String>,
    pub downloads: u64,
    pub icon_url: Option<String>,
    pub platform: ModPlatform,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModSearchPage {
    pub mods: Vec<ModSummary>,
    pub offset: u32,
    pub limit: u32,
    pub total_hits: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModUpdateInfo {
    pub mod_id: String,
    pub registry_mod_id: String,
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
    pub latest_version_id: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityResult {
    pub compatible: bool,
    pub issues: Vec<String>,
    /// Version that would be installed, when one exists for the game version.
    pub candidate_version: Option<String>,
    /// Required dependency project ids not installed in the profile.
    pub missing_dependencies: Vec<String>,
}
