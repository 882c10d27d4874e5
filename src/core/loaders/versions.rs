// ─── Loader Versions ───
// Lists installable loader versions for a game version.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::downloader::{FetchClient, FetchRequest};
use crate::core::error::LauncherResult;
use crate::core::instance::LoaderType;
use crate::core::maven::MavenMetadata;
use crate::core::state::Endpoints;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderVersion {
    pub version: String,
    pub stable: bool,
}

#[derive(Debug, Deserialize)]
struct MetaLoaderEntry {
    loader: MetaLoaderInfo,
}

#[derive(Debug, Deserialize)]
struct MetaLoaderInfo {
    version: String,
    #[serde(default)]
    stable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ForgePromotions {
    #[serde(default)]
    promos: HashMap<String, String>,
}

/// Newest first, as the upstream services order them.
pub async fn list_loader_versions(
    fetch: &FetchClient,
    endpoints: &Endpoints,
    loader: LoaderType,
    game_version: &str,
) -> LauncherResult<Vec<LoaderVersion>> {
    let versions = match loader {
        LoaderType::Fabric | LoaderType::Quilt => {
            let base = if loader == LoaderType::Quilt {
                &endpoints.quilt_meta
            } else {
                &endpoints.fabric_meta
            };
            let url = format!(
                "{}/versions/loader/{}",
                base.trim_end_matches('/'),
                game_version
            );
            let entries: Vec<MetaLoaderEntry> = fetch.fetch_json(FetchRequest::get(url)).await?;
            entries
                .into_iter()
                .map(|entry| LoaderVersion {
                    stable: entry
                        .loader
                        .stable
                        .unwrap_or_else(|| !is_prerelease(&entry.loader.version)),
                    version: entry.loader.version,
                })
                .collect()
        }
        LoaderType::Forge => {
            let promotions: ForgePromotions = fetch
                .fetch_json(FetchRequest::get(endpoints.forge_promotions.clone()))
                .await?;
            forge_versions(&promotions.promos, game_version)
        }
        LoaderType::NeoForge => {
            let xml = fetch
                .fetch_text(FetchRequest::get(endpoints.neoforge_metadata.clone()))
                .await?;
            let metadata = MavenMetadata::parse(&xml)?;
            neoforge_versions(metadata.versions(), game_version)
        }
    };

    debug!(
        "{} versions of {} for Minecraft {}",
        versions.len(),
        loader,
        game_version
    );
    Ok(versions)
}

fn is_prerelease(version: &str) -> bool {
    let lower = version.to_ascii_lowercase();
    lower.contains("beta") || lower.contains("alpha") || lower.contains("rc") || lower.contains("pre")
}

/// Forge only publishes the recommended and latest build per game version.
fn forge_versions(promos: &HashMap<String, String>, game_version: &str) -> Vec<LoaderVersion> {
    let mut out = Vec::new();
    if let Some(v) = promos.get(&format!("{}-recommended", game_version)) {
        out.push(LoaderVersion {
            version: v.clone(),
            stable: true,
        });
    }
    if let Some(v) = promos.get(&format!("{}-latest", game_version)) {
        if out.iter().all(|existing| &existing.version != v) {
            out.push(LoaderVersion {
                version: v.clone(),
                stable: false,
            });
        }
    }
    out
}

/// NeoForge numbers its builds after the game version without the leading `1.`:
/// Minecraft `1.20.4` maps to `20.4.x`, `1.21` to `21.0.x`.
fn neoforge_versions(all: &[String], game_version: &str) -> Vec<LoaderVersion> {
    let Some(rest) = game_version.strip_prefix("1.") else {
        return Vec::new();
    };
    let prefix = if rest.contains('.') {
        format!("{}.", rest)
    } else {
        format!("{}.0.", rest)
    };

    all.iter()
        .rev()
        .filter(|v| v.starts_with(&prefix))
        .map(|v| LoaderVersion {
            version: v.clone(),
            stable: !is_prerelease(v),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_promotions_pick_recommended_then_latest() {
        let promos = HashMap::from([
            ("1.20.1-recommended".to_string(), "47.2.0".to_string()),
            ("1.20.1-latest".to_string(), "47.3.0".to_string()),
            ("1.19.2-latest".to_string(), "43.3.0".to_string()),
        ]);
        let versions = forge_versions(&promos, "1.20.1");
        assert_eq!(
            versions,
            vec![
                LoaderVersion {
                    version: "47.2.0".into(),
                    stable: true
                },
                LoaderVersion {
                    version: "47.3.0".into(),
                    stable: false
                },
            ]
        );
        assert!(forge_versions(&promos, "1.8.9").is_empty());
    }

    #[test]
    fn neoforge_filters_by_game_version_prefix() {
        let all: Vec<String> = ["20.2.86", "20.4.70-beta", "20.4.80", "21.0.1-beta"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let v = neoforge_versions(&all, "1.20.4");
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].version, "20.4.80");
        assert!(v[0].stable);
        assert!(!v[1].stable);

        let v21 = neoforge_versions(&all, "1.21");
        assert_eq!(v21.len(), 1);
        assert_eq!(v21[0].version, "21.0.1-beta");
    }

    #[test]
    fn meta_entries_without_stable_flag_use_version_text() {
        let entries: Vec<MetaLoaderEntry> = serde_json::from_str(
            r#"[{"loader": {"version": "0.26.0-beta.1"}}, {"loader": {"version": "0.25.0"}}]"#,
        )
        .unwrap();
        assert!(is_prerelease(&entries[0].loader.version));
        assert!(!is_prerelease(&entries[1].loader.version));
    }
}
