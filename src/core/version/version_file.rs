// ─── Version File ───
// Typed view of a Mojang version JSON and the OS rules of its libraries.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// A fully parsed version JSON. The raw upstream text is what gets cached on
/// disk; this struct is only the part the launcher reads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDetail {
    pub id: String,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub downloads: VersionDownloads,
    #[serde(default)]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub java_version: Option<JavaVersionInfo>,
    #[serde(default, rename = "type")]
    pub release_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    #[serde(default)]
    pub component: Option<String>,
    pub major_version: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
    pub client_mappings: Option<DownloadArtifact>,
    pub server: Option<DownloadArtifact>,
    pub server_mappings: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

// ─── Libraries ───

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Library {
    /// Maven coordinate, e.g. `org.lwjgl:lwjgl:3.3.1`.
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Vec<PlatformRule>,
    /// OS name -> classifier, e.g. `"linux": "natives-linux"`.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: Option<HashMap<String, LibraryArtifact>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryArtifact {
    /// Maven-style path relative to the shared library directory.
    pub path: String,
    pub sha1: String,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

// ─── Platform Rules ───

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlatformRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsConstraint>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    #[serde(alias = "deny")]
    Disallow,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OsConstraint {
    #[serde(default)]
    pub name: Option<OsName>,
    #[serde(default)]
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OsName {
    Windows,
    #[serde(alias = "macos")]
    Osx,
    Linux,
    #[serde(other)]
    Unknown,
}

impl OsName {
    /// Mojang's name for the host platform.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsName::Windows
        } else if cfg!(target_os = "macos") {
            OsName::Osx
        } else {
            OsName::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsName::Windows => "windows",
            OsName::Osx => "osx",
            OsName::Linux => "linux",
            OsName::Unknown => "unknown",
        }
    }
}

fn current_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "x86"
    }
}

impl OsConstraint {
    fn matches(&self, os: OsName) -> bool {
        let name_ok = self.name.map_or(true, |name| name == os);
        let arch_ok = self
            .arch
            .as_deref()
            .map_or(true, |arch| arch == current_arch());
        name_ok && arch_ok
    }
}

/// Evaluate rules top-to-bottom; the last matching rule wins and no match allows.
pub fn evaluate_rules(rules: &[PlatformRule], os: OsName) -> bool {
    rules
        .iter()
        .filter(|rule| rule.os.as_ref().map_or(true, |c| c.matches(os)))
        .last()
        .map_or(true, |rule| rule.action == RuleAction::Allow)
}

impl Library {
    pub fn is_allowed_on(&self, os: OsName) -> bool {
        evaluate_rules(&self.rules, os)
    }

    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Native classifier jar for `os`, with `${arch}` substituted.
    pub fn native_artifact(&self, os: OsName) -> Option<&LibraryArtifact> {
        let classifier = self.natives.as_ref()?.get(os.as_str())?;
        let arch = if cfg!(target_pointer_width = "64") { "64" } else { "32" };
        let classifier = classifier.replace("${arch}", arch);
        self.downloads
            .as_ref()?
            .classifiers
            .as_ref()?
            .get(&classifier)
    }
}

impl VersionDetail {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        Self::parse(&raw)
    }

    /// Name passed as `--assetIndex`.
    pub fn asset_index_id(&self) -> &str {
        self.asset_index
            .as_ref()
            .map(|idx| idx.id.as_str())
            .or(self.assets.as_deref())
            .unwrap_or(&self.id)
    }
}
