// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::downloader::{FetchClient, FetchRequest};
use crate::core::error::LauncherResult;

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
    #[serde(other)]
    Other,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    pub release_time: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

/// What `list_versions` hands to callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub id: String,
    pub release_type: ReleaseType,
    pub release_time: DateTime<Utc>,
    pub manifest_url: String,
    pub content_hash: Option<String>,
    pub installed: bool,
}

impl VersionEntry {
    pub fn descriptor(&self, installed: bool) -> VersionDescriptor {
        VersionDescriptor {
            id: self.id.clone(),
            release_type: self.release_type,
            release_time: self.release_time,
            manifest_url: self.url.clone(),
            content_hash: self.sha1.clone(),
            installed,
        }
    }
}

impl VersionManifest {
    pub async fn fetch(fetch: &FetchClient, url: &str) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");
        let manifest: VersionManifest = fetch.fetch_json(FetchRequest::get(url)).await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_manifest() {
        let json = r#"{
            "latest": {"release": "1.20.4", "snapshot": "24w03a"},
            "versions": [
                {
                    "id": "1.20.4",
                    "type": "release",
                    "url": "https://example.com/1.20.4.json",
                    "time": "2023-12-07T08:00:00+00:00",
                    "releaseTime": "2023-12-07T08:00:00+00:00",
                    "sha1": "abc123"
                },
                {
                    "id": "b1.7.3",
                    "type": "old_beta",
                    "url": "https://example.com/b1.7.3.json",
                    "releaseTime": "2011-07-08T00:00:00+00:00"
                }
            ]
        }"#;
        let manifest: VersionManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.latest.release, "1.20.4");

        let entry = manifest.find_version("1.20.4").unwrap();
        assert_eq!(entry.release_type, ReleaseType::Release);
        assert_eq!(entry.sha1.as_deref(), Some("abc123"));

        let beta = manifest.find_version("b1.7.3").unwrap();
        assert_eq!(beta.release_type, ReleaseType::OldBeta);
        assert!(beta.descriptor(false).content_hash.is_none());
    }
}
