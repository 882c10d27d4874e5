// ─── Registry Models ───
// Subset of the Modrinth v2 API payloads the launcher reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub offset: u32,
    pub limit: u32,
    pub total_hits: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchHit {
    pub project_id: String,
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Project {
    pub id: String,
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectVersion {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub version_number: String,
    pub date_published: DateTime<Utc>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionFile {
    pub hashes: FileHashes,
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileHashes {
    pub sha1: Option<String>,
    pub sha512: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Required,
    Optional,
    Incompatible,
    Embedded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dependency {
    pub version_id: Option<String>,
    pub project_id: Option<String>,
    pub dependency_type: DependencyType,
}

impl ProjectVersion {
    /// The file flagged primary, else the first one listed.
    pub fn primary_file(&self) -> Option<&VersionFile> {
        self.files
            .iter()
            .find(|f| f.primary)
            .or_else(|| self.files.first())
    }

    pub fn supports(&self, game_version: &str, loader: Option<&str>) -> bool {
        self.game_versions.iter().any(|v| v == game_version)
            && loader.map_or(true, |l| self.loaders.iter().any(|x| x.eq_ignore_ascii_case(l)))
    }
}

/// Newest `date_published` among the versions compatible with `game_version`.
pub fn newest_for<'a>(
    versions: &'a [ProjectVersion],
    game_version: &str,
    loader: Option<&str>,
) -> Option<&'a ProjectVersion> {
    versions
        .iter()
        .filter(|v| v.supports(game_version, loader))
        .max_by_key(|v| v.date_published)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(id: &str, date: &str, games: &[&str], loaders: &[&str]) -> ProjectVersion {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "project_id": "P",
            "name": id,
            "version_number": id,
            "date_published": date,
            "game_versions": games,
            "loaders": loaders,
            "files": [],
            "dependencies": []
        }))
        .unwrap()
    }

    #[test]
    fn newest_picks_latest_publish_date_for_game_version() {
        let versions = vec![
            version("a", "2023-06-01T00:00:00Z", &["1.20.1"], &["fabric"]),
            version("b", "2024-01-01T00:00:00Z", &["1.20.1"], &["forge"]),
            version("c", "2023-09-01T00:00:00Z", &["1.20.1"], &["fabric"]),
            version("d", "2024-05-01T00:00:00Z", &["1.20.4"], &["fabric"]),
        ];
        assert_eq!(newest_for(&versions, "1.20.1", Some("fabric")).unwrap().id, "c");
        assert_eq!(newest_for(&versions, "1.20.1", None).unwrap().id, "b");
        assert!(newest_for(&versions, "1.19.2", None).is_none());
    }

    #[test]
    fn primary_file_falls_back_to_first() {
        let mut v = version("a", "2023-06-01T00:00:00Z", &["1.20.1"], &["fabric"]);
        v.files = serde_json::from_str(
            r#"[
                {"hashes": {"sha1": "11"}, "url": "https://cdn/x-sources.jar", "filename": "x-sources.jar", "primary": false},
                {"hashes": {"sha1": "22"}, "url": "https://cdn/x.jar", "filename": "x.jar", "primary": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(v.primary_file().unwrap().filename, "x.jar");
        v.files[1].primary = false;
        assert_eq!(v.primary_file().unwrap().filename, "x-sources.jar");
    }

    #[test]
    fn unknown_dependency_type_is_tolerated() {
        let dep: Dependency = serde_json::from_str(
            r#"{"version_id": null, "project_id": "P7dR8mSH", "dependency_type": "bundled"}"#,
        )
        .unwrap();
        assert_eq!(dep.dependency_type, DependencyType::Unknown);
    }
}
