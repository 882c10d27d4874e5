// ─── Mod Manager ───
// Installs registry mods into a profile's `mods/` directory and keeps the
// store records in step with the files on disk.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::model::{
    CompatibilityResult, InstalledMod, ModPlatform, ModSearchPage, ModSummary, ModUpdateInfo,
};
use super::toggle::{remove_mod_files, set_file_enabled};
use crate::core::downloader::{
    ChunkProgress, DownloadProgress, DownloadTask, FetchClient, ProgressReporter, TransferState,
};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::{Profile, ProfileDirs};
use crate::core::modrinth::{newest_for, DependencyType, ProjectVersion, RegistryClient, SearchQuery};
use crate::core::store::EntityStore;

pub struct ModManager {
    registry: Arc<RegistryClient>,
    fetch: Arc<FetchClient>,
    store: Arc<dyn EntityStore>,
    instances_dir: PathBuf,
}

fn ensure_supported(platform: ModPlatform) -> LauncherResult<()> {
    match platform {
        ModPlatform::Modrinth => Ok(()),
        other => Err(LauncherError::NotImplemented(format!("{} mod platform", other))),
    }
}

impl ModManager {
    pub fn new(
        registry: Arc<RegistryClient>,
        fetch: Arc<FetchClient>,
        store: Arc<dyn EntityStore>,
        instances_dir: PathBuf,
    ) -> Self {
        Self {
            registry,
            fetch,
            store,
            instances_dir,
        }
    }

    fn mods_dir(&self, profile_id: &str) -> PathBuf {
        ProfileDirs::new(&self.instances_dir, profile_id).mods_dir()
    }

    async fn require_profile(&self, profile_id: &str) -> LauncherResult<Profile> {
        self.store
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| LauncherError::not_found("profile", profile_id))
    }

    async fn require_mod(&self, installed_mod_id: &str) -> LauncherResult<InstalledMod> {
        self.store
            .get_mod(installed_mod_id)
            .await?
            .ok_or_else(|| LauncherError::not_found("installed mod", installed_mod_id))
    }

    // ── Search ──────────────────────────────────────────

    pub async fn search(
        &self,
        platform: ModPlatform,
        query: SearchQuery,
    ) -> LauncherResult<ModSearchPage> {
        ensure_supported(platform)?;
        info!("Searching mods: {:?} on {}", query.query, platform);

        let page = self.registry.search(&query).await?;
        Ok(ModSearchPage {
            mods: page
                .hits
                .into_iter()
                .map(|hit| ModSummary {
                    registry_mod_id: hit.project_id,
                    slug: hit.slug,
                    name: hit.title,
                    description: hit.description,
                    author: hit.author,
                    downloads: hit.downloads,
                    icon_url: hit.icon_url,
                    platform,
                })
                .collect(),
            offset: page.offset,
            limit: page.limit,
            total_hits: page.total_hits,
        })
    }

    pub async fn installed_mods(&self, profile_id: &str) -> LauncherResult<Vec<InstalledMod>> {
        self.store.mods_for_profile(profile_id).await
    }

    // ── Install / uninstall ─────────────────────────────

    pub async fn install(
        &self,
        profile_id: &str,
        registry_mod_id: &str,
        version_id: &str,
        platform: ModPlatform,
        reporter: &ProgressReporter,
    ) -> LauncherResult<InstalledMod> {
        ensure_supported(platform)?;
        let result = self
            .install_inner(profile_id, registry_mod_id, version_id, platform, reporter)
            .await;
        if let Err(e) = &result {
            error!("Failed to install mod {}: {}", registry_mod_id, e);
            reporter.report(DownloadProgress {
                downloaded_bytes: 0,
                total_bytes: None,
                current_file: String::new(),
                status: "Installation failed".into(),
                state: TransferState::Failed(e.to_string()),
            });
        }
        result
    }

    async fn install_inner(
        &self,
        profile_id: &str,
        registry_mod_id: &str,
        version_id: &str,
        platform: ModPlatform,
        reporter: &ProgressReporter,
    ) -> LauncherResult<InstalledMod> {
        info!(
            "Installing mod {} version {} to profile {}",
            registry_mod_id, version_id, profile_id
        );
        self.require_profile(profile_id).await?;

        if self.store.find_mod(profile_id, registry_mod_id).await?.is_some() {
            return Err(LauncherError::Conflict {
                kind: "mod",
                id: format!("{}/{}", profile_id, registry_mod_id),
            });
        }

        let version = self.registry.version(version_id).await?;
        if version.project_id != registry_mod_id {
            return Err(LauncherError::not_found(
                "mod version",
                format!("{} of {}", version_id, registry_mod_id),
            ));
        }
        let project = self.registry.project(registry_mod_id).await?;
        let file = version
            .primary_file()
            .ok_or_else(|| LauncherError::not_found("mod file", version_id))?;

        let mods_dir = self.mods_dir(profile_id);
        tokio::fs::create_dir_all(&mods_dir)
            .await
            .map_err(|e| LauncherError::io(&mods_dir, e))?;
        let dest = mods_dir.join(&file.filename);

        let mut task = DownloadTask::new(file.url.clone(), dest.clone()).size(file.size);
        if let Some(sha512) = &file.hashes.sha512 {
            task = task.sha512(sha512.clone());
        } else if let Some(sha1) = &file.hashes.sha1 {
            task = task.sha1(sha1.clone());
        } else {
            warn!("{} declares no hash, installing unverified", file.filename);
        }

        let status = format!("Downloading {}", file.filename);
        let observer = |chunk: ChunkProgress| {
            reporter.report(DownloadProgress {
                downloaded_bytes: chunk.bytes_so_far,
                total_bytes: chunk.total_bytes,
                current_file: file.filename.clone(),
                status: status.clone(),
                state: TransferState::InProgress,
            });
        };
        let bytes = self.fetch.download(&task, &observer).await?;

        let record = InstalledMod::new(
            profile_id,
            registry_mod_id,
            project.title.clone(),
            version.version_number.clone(),
            version.id.clone(),
            file.filename.clone(),
            platform,
        );
        if let Err(e) = self.store.add_mod(&record).await {
            // Never leave a file the store does not know about.
            let _ = remove_mod_files(&dest).await;
            return Err(e);
        }

        reporter.report(DownloadProgress {
            downloaded_bytes: bytes,
            total_bytes: Some(bytes),
            current_file: file.filename.clone(),
            status: "Installation complete".into(),
            state: TransferState::Completed,
        });
        info!("Installed mod {} {}", record.name, record.version);
        Ok(record)
    }

    /// False when no such record exists.
    pub async fn uninstall(&self, installed_mod_id: &str) -> LauncherResult<bool> {
        let Some(record) = self.store.get_mod(installed_mod_id).await? else {
            return Ok(false);
        };
        let path = self.mods_dir(&record.profile_id).join(&record.file_name);
        let removed = remove_mod_files(&path).await?;
        if removed == 0 {
            debug!("No file on disk for {}, removing record only", record.name);
        }
        self.store.remove_mod(&record.id).await?;
        info!("Uninstalled mod {}", record.name);
        Ok(true)
    }

    pub async fn toggle(&self, installed_mod_id: &str, enabled: bool) -> LauncherResult<InstalledMod> {
        let mut record = self.require_mod(installed_mod_id).await?;
        let path = self.mods_dir(&record.profile_id).join(&record.file_name);
        set_file_enabled(&path, enabled).await?;

        if record.enabled != enabled {
            record.enabled = enabled;
            self.store.update_mod(&record).await?;
        }
        info!(
            "{} mod {}",
            if enabled { "Enabled" } else { "Disabled" },
            record.name
        );
        Ok(record)
    }

    // ── Updates ─────────────────────────────────────────

    /// Per-mod failures are logged and skipped.
    pub async fn check_for_updates(&self, profile_id: &str) -> LauncherResult<Vec<ModUpdateInfo>> {
        let profile = self.require_profile(profile_id).await?;
        let mut updates = Vec::new();

        for record in self.store.mods_for_profile(profile_id).await? {
            if record.platform != ModPlatform::Modrinth {
                continue;
            }
            match self.newest_version(&profile, &record.registry_mod_id).await {
                Ok(Some(latest)) => {
                    let has_update = latest.version_number != record.version;
                    if has_update {
                        updates.push(ModUpdateInfo {
                            mod_id: record.id.clone(),
                            registry_mod_id: record.registry_mod_id.clone(),
                            name: record.name.clone(),
                            current_version: record.version.clone(),
                            latest_version: latest.version_number.clone(),
                            latest_version_id: latest.id.clone(),
                        });
                    }
                    let mut updated = record.clone();
                    updated.latest_version = Some(latest.version_number);
                    updated.has_update = has_update;
                    if updated != record {
                        if let Err(e) = self.store.update_mod(&updated).await {
                            warn!("Could not record update state for {}: {}", record.name, e);
                        }
                    }
                }
                Ok(None) => {
                    debug!("No version of {} for {}", record.name, profile.version_id);
                    if record.has_update || record.latest_version.is_some() {
                        let mut cleared = record.clone();
                        cleared.latest_version = None;
                        cleared.has_update = false;
                        if let Err(e) = self.store.update_mod(&cleared).await {
                            warn!("Could not record update state for {}: {}", record.name, e);
                        }
                    }
                }
                Err(e) => warn!("Update check failed for {}: {}", record.name, e),
            }
        }

        info!("{} mod updates available for {}", updates.len(), profile.name);
        Ok(updates)
    }

    async fn newest_version(
        &self,
        profile: &Profile,
        registry_mod_id: &str,
    ) -> LauncherResult<Option<ProjectVersion>> {
        let loader = profile.loader.map(|l| l.as_str());
        let versions = self
            .registry
            .versions(registry_mod_id, Some(&profile.version_id), loader)
            .await?;
        Ok(newest_for(&versions, &profile.version_id, loader).cloned())
    }

    /// Replace an installed mod with its newest compatible version.
    pub async fn update(
        &self,
        installed_mod_id: &str,
        reporter: &ProgressReporter,
    ) -> LauncherResult<InstalledMod> {
        let record = self.require_mod(installed_mod_id).await?;
        ensure_supported(record.platform)?;
        let profile = self.require_profile(&record.profile_id).await?;

        // The old mod stays until a replacement is known to exist.
        let latest = self
            .newest_version(&profile, &record.registry_mod_id)
            .await?
            .ok_or_else(|| LauncherError::NoCompatibleVersion {
                mod_id: record.registry_mod_id.clone(),
                game_version: profile.version_id.clone(),
            })?;

        self.uninstall(&record.id).await?;
        let installed = self
            .install(
                &record.profile_id,
                &record.registry_mod_id,
                &latest.id,
                record.platform,
                reporter,
            )
            .await?;

        let installed = if record.enabled {
            installed
        } else {
            self.toggle(&installed.id, false).await?
        };
        info!(
            "Updated mod {} from {} to {}",
            installed.name, record.version, installed.version
        );
        Ok(installed)
    }

    // ── Compatibility ───────────────────────────────────

    /// Collects every blocking reason instead of stopping at the first.
    pub async fn check_compatibility(
        &self,
        profile_id: &str,
        registry_mod_id: &str,
        platform: ModPlatform,
    ) -> LauncherResult<CompatibilityResult> {
        ensure_supported(platform)?;
        let profile = self.require_profile(profile_id).await?;
        let mut result = CompatibilityResult::default();

        let versions = self
            .registry
            .versions(registry_mod_id, Some(&profile.version_id), None)
            .await?;
        let Some(candidate) = newest_for(&versions, &profile.version_id, None) else {
            result
                .issues
                .push(format!("No version compatible with Minecraft {}", profile.version_id));
            return Ok(result);
        };
        result.candidate_version = Some(candidate.version_number.clone());

        if let Some(loader) = profile.loader {
            if !candidate.loaders.iter().any(|l| l == loader.as_str()) {
                result.issues.push(format!(
                    "Mod requires a different loader. Supported: {}",
                    candidate.loaders.join(", ")
                ));
            }
        }

        let installed = self.store.mods_for_profile(profile_id).await?;
        for dep in &candidate.dependencies {
            let Some(dep_project) = dep.project_id.as_deref() else {
                continue;
            };
            let present = installed.iter().find(|m| m.registry_mod_id == dep_project);
            match (dep.dependency_type, present) {
                (DependencyType::Incompatible, Some(m)) => {
                    result.issues.push(format!("Incompatible with installed mod {}", m.name));
                }
                (DependencyType::Required, None) => {
                    result.missing_dependencies.push(dep_project.to_string());
                }
                _ => {}
            }
        }
        result.compatible = result.issues.is_empty();
        debug!(
            "Compatibility of {} with {}: {} ({} issues)",
            registry_mod_id,
            profile.name,
            result.compatible,
            result.issues.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curseforge_is_not_implemented() {
        assert!(ensure_supported(ModPlatform::Modrinth).is_ok());
        assert!(matches!(
            ensure_supported(ModPlatform::CurseForge),
            Err(LauncherError::NotImplemented(_))
        ));
    }
}
