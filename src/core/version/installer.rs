// ─── Version Installer ───
// Turns a version id into a local install: client jar, libraries, asset index,
// optional loader. `<id>.json` is committed last, so its presence means the
// whole install succeeded.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::manifest::{VersionDescriptor, VersionManifest};
use super::version_file::{OsName, VersionDetail};
use crate::core::downloader::{
    sha1_file, ChunkProgress, DownloadProgress, DownloadTask, FetchClient, FetchRequest,
    ProgressReporter, TransferState,
};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::LoaderType;
use crate::core::loaders::{read_marker, write_marker, InstallContext, Installer, LoaderInstallResult};
use crate::core::state::{Endpoints, LauncherPaths};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderRequest {
    pub loader: LoaderType,
    pub loader_version: String,
}

impl LoaderRequest {
    pub fn new(loader: LoaderType, loader_version: impl Into<String>) -> Self {
        Self {
            loader,
            loader_version: loader_version.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResult {
    pub version_id: String,
    pub version_dir: PathBuf,
    pub bytes_downloaded: u64,
    pub libraries_downloaded: usize,
    pub libraries_skipped: usize,
    pub loader: Option<LoaderInstallResult>,
}

/// Byte counter shared by every download of one install.
struct InstallProgress<'a> {
    reporter: &'a ProgressReporter,
    downloaded: AtomicU64,
    planned: AtomicU64,
}

impl<'a> InstallProgress<'a> {
    fn new(reporter: &'a ProgressReporter) -> Self {
        Self {
            reporter,
            downloaded: AtomicU64::new(0),
            planned: AtomicU64::new(0),
        }
    }

    fn plan(&self, bytes: u64) {
        self.planned.fetch_add(bytes, Ordering::Relaxed);
    }

    fn emit(&self, status: &str, file: &str, state: TransferState) {
        let planned = self.planned.load(Ordering::Relaxed);
        self.reporter.report(DownloadProgress {
            downloaded_bytes: self.downloaded.load(Ordering::Relaxed),
            total_bytes: (planned > 0).then_some(planned),
            current_file: file.to_string(),
            status: status.to_string(),
            state,
        });
    }

    fn step(&self, status: &str) {
        self.emit(status, "", TransferState::InProgress);
    }

    fn observer<'b>(&'b self, status: &'b str, file: &'b str) -> impl Fn(ChunkProgress) + Send + Sync + 'b {
        move |chunk| {
            self.downloaded.fetch_add(chunk.chunk_len, Ordering::Relaxed);
            self.emit(status, file, TransferState::InProgress);
        }
    }

    fn total(&self) -> u64 {
        self.downloaded.load(Ordering::Relaxed)
    }
}

pub struct VersionInstaller {
    fetch: Arc<FetchClient>,
    paths: LauncherPaths,
    endpoints: Endpoints,
}

impl VersionInstaller {
    pub fn new(fetch: Arc<FetchClient>, paths: LauncherPaths, endpoints: Endpoints) -> Self {
        Self {
            fetch,
            paths,
            endpoints,
        }
    }

    pub fn paths(&self) -> &LauncherPaths {
        &self.paths
    }

    // ── Queries ─────────────────────────────────────────

    pub async fn list_versions(&self) -> LauncherResult<Vec<VersionDescriptor>> {
        let manifest = VersionManifest::fetch(&self.fetch, &self.endpoints.version_manifest).await?;
        let installed: HashSet<String> = self.installed_versions().await?.into_iter().collect();

        Ok(manifest
            .versions
            .iter()
            .map(|entry| entry.descriptor(installed.contains(&entry.id)))
            .collect())
    }

    /// Ids whose directory holds both the detail JSON and the client jar.
    pub async fn installed_versions(&self) -> LauncherResult<Vec<String>> {
        let versions_dir = self.paths.versions_dir();
        let mut entries = match tokio::fs::read_dir(&versions_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LauncherError::io(versions_dir, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LauncherError::io(&versions_dir, e))?
        {
            let id = entry.file_name().to_string_lossy().to_string();
            if self.validate_version(&id).await {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Existence check only; hashes are not re-verified.
    pub async fn validate_version(&self, version_id: &str) -> bool {
        let json = tokio::fs::try_exists(self.paths.version_json(version_id));
        let jar = tokio::fs::try_exists(self.paths.version_jar(version_id));
        matches!(tokio::join!(json, jar), (Ok(true), Ok(true)))
    }

    pub async fn load_detail(&self, version_id: &str) -> LauncherResult<VersionDetail> {
        VersionDetail::load(&self.paths.version_json(version_id)).await
    }

    pub async fn installed_loader(
        &self,
        version_id: &str,
        loader: LoaderType,
        loader_version: &str,
    ) -> LauncherResult<Option<LoaderInstallResult>> {
        read_marker(&self.paths.version_dir(version_id), loader, loader_version).await
    }

    // ── Mutations ───────────────────────────────────────

    pub async fn delete_version(&self, version_id: &str) -> LauncherResult<bool> {
        let dir = self.paths.version_dir(version_id);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(false);
        }
        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| LauncherError::io(&dir, e))?;
        info!("Deleted version {}", version_id);
        Ok(true)
    }

    pub async fn install_version(
        &self,
        version_id: &str,
        loader: Option<&LoaderRequest>,
        reporter: &ProgressReporter,
    ) -> LauncherResult<InstallResult> {
        let progress = InstallProgress::new(reporter);
        match self.run_install(version_id, loader, &progress).await {
            Ok(result) => {
                progress.emit("Installed", version_id, TransferState::Completed);
                Ok(result)
            }
            Err(e) => {
                progress.emit("Install failed", version_id, TransferState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run_install(
        &self,
        version_id: &str,
        loader: Option<&LoaderRequest>,
        progress: &InstallProgress<'_>,
    ) -> LauncherResult<InstallResult> {
        // Unsupported loaders fail before anything is downloaded.
        let loader_installer = loader.map(|req| Installer::new(req.loader)).transpose()?;

        // 1. descriptor
        progress.step("Resolving version");
        let manifest = VersionManifest::fetch(&self.fetch, &self.endpoints.version_manifest).await?;
        let entry = manifest
            .find_version(version_id)
            .ok_or_else(|| LauncherError::not_found("version", version_id))?;

        // 2. detail
        progress.step("Fetching version details");
        let raw_detail = self.fetch.fetch_text(FetchRequest::get(entry.url.clone())).await?;
        let detail = VersionDetail::parse(&raw_detail)?;

        let version_dir = self.paths.version_dir(version_id);
        tokio::fs::create_dir_all(&version_dir)
            .await
            .map_err(|e| LauncherError::io(&version_dir, e))?;

        // 3. client jar
        self.install_client(version_id, &detail, progress).await?;

        // 4. libraries
        let (libraries_downloaded, libraries_skipped) = self.install_libraries(&detail, progress).await?;

        // 5. asset index
        self.install_asset_index(&detail, progress).await?;

        // 6. loader
        let loader_result = match (loader, loader_installer) {
            (Some(req), Some(installer)) => {
                progress.step("Installing loader");
                Some(self.install_loader_with(version_id, req, &installer).await?)
            }
            _ => None,
        };

        // 7. commit
        progress.step("Finalizing");
        let json_path = self.paths.version_json(version_id);
        let temp = json_path.with_extension("json.tmp");
        tokio::fs::write(&temp, &raw_detail)
            .await
            .map_err(|e| LauncherError::io(&temp, e))?;
        tokio::fs::rename(&temp, &json_path)
            .await
            .map_err(|e| LauncherError::io(&json_path, e))?;

        info!(
            "Installed {} ({} libraries downloaded, {} already present)",
            version_id, libraries_downloaded, libraries_skipped
        );

        Ok(InstallResult {
            version_id: version_id.to_string(),
            version_dir,
            bytes_downloaded: progress.total(),
            libraries_downloaded,
            libraries_skipped,
            loader: loader_result,
        })
    }

    async fn install_client(
        &self,
        version_id: &str,
        detail: &VersionDetail,
        progress: &InstallProgress<'_>,
    ) -> LauncherResult<()> {
        let client = detail
            .downloads
            .client
            .as_ref()
            .ok_or_else(|| LauncherError::not_found("client download", version_id))?;
        let jar = self.paths.version_jar(version_id);

        if tokio::fs::try_exists(&jar).await.unwrap_or(false)
            && sha1_file(&jar).await?.eq_ignore_ascii_case(&client.sha1)
        {
            debug!("Client jar for {} already verified", version_id);
            return Ok(());
        }

        progress.plan(client.size);
        progress.step("Downloading client");
        let file = format!("{}.jar", version_id);
        let task = DownloadTask::new(client.url.clone(), jar)
            .sha1(client.sha1.clone())
            .size(Some(client.size));
        self.fetch
            .download(&task, &progress.observer("Downloading client", &file))
            .await?;
        Ok(())
    }

    /// Returns `(downloaded, skipped)`. Every download is joined before returning.
    async fn install_libraries(
        &self,
        detail: &VersionDetail,
        progress: &InstallProgress<'_>,
    ) -> LauncherResult<(usize, usize)> {
        let os = OsName::current();
        let libs_dir = self.paths.libraries_dir();
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();
        let mut skipped = 0usize;

        for library in detail.libraries.iter().filter(|lib| lib.is_allowed_on(os)) {
            for artifact in [library.artifact(), library.native_artifact(os)]
                .into_iter()
                .flatten()
            {
                if !seen.insert(artifact.path.clone()) {
                    continue;
                }
                let dest = libs_dir.join(&artifact.path);
                if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                    skipped += 1;
                    continue;
                }
                progress.plan(artifact.size.unwrap_or(0));
                tasks.push(
                    DownloadTask::new(artifact.url.clone(), dest)
                        .sha1(artifact.sha1.clone())
                        .size(artifact.size),
                );
            }
        }

        let downloaded = tasks.len();
        progress.step("Downloading libraries");
        let failures = self
            .fetch
            .download_batch(tasks, &progress.observer("Downloading libraries", "libraries"))
            .await;

        for (task, err) in &failures {
            warn!("Library download failed for {}: {}", task.url, err);
        }
        if let Some((_, err)) = failures.into_iter().next() {
            return Err(err);
        }

        Ok((downloaded, skipped))
    }

    async fn install_asset_index(
        &self,
        detail: &VersionDetail,
        progress: &InstallProgress<'_>,
    ) -> LauncherResult<()> {
        let Some(index) = detail.asset_index.as_ref() else {
            warn!("Version {} declares no asset index", detail.id);
            return Ok(());
        };
        let dest = self.paths.asset_index(&index.id);

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            match &index.sha1 {
                Some(expected) if !sha1_file(&dest).await?.eq_ignore_ascii_case(expected) => {
                    debug!("Asset index {} is stale, re-downloading", index.id);
                }
                _ => return Ok(()),
            }
        }

        progress.plan(index.size.unwrap_or(0));
        progress.step("Downloading asset index");
        let file = format!("{}.json", index.id);
        let mut task = DownloadTask::new(index.url.clone(), dest).size(index.size);
        if let Some(sha1) = &index.sha1 {
            task = task.sha1(sha1.clone());
        }
        self.fetch
            .download(&task, &progress.observer("Downloading asset index", &file))
            .await?;
        Ok(())
    }

    /// Install a loader on top of an existing version. A no-op when the same
    /// `(version, loader, loader version)` was applied before.
    pub async fn install_loader(
        &self,
        version_id: &str,
        request: &LoaderRequest,
    ) -> LauncherResult<LoaderInstallResult> {
        let installer = Installer::new(request.loader)?;
        self.install_loader_with(version_id, request, &installer).await
    }

    async fn install_loader_with(
        &self,
        version_id: &str,
        request: &LoaderRequest,
        installer: &Installer,
    ) -> LauncherResult<LoaderInstallResult> {
        let version_dir = self.paths.version_dir(version_id);
        if let Some(existing) = read_marker(&version_dir, request.loader, &request.loader_version).await? {
            info!(
                "{} {} already installed for {}",
                request.loader, request.loader_version, version_id
            );
            return Ok(existing);
        }

        let libs_dir = self.paths.libraries_dir();
        let result = installer
            .install(InstallContext {
                minecraft_version: version_id,
                loader_version: &request.loader_version,
                version_dir: &version_dir,
                libs_dir: &libs_dir,
                fetch: &self.fetch,
                endpoints: &self.endpoints,
            })
            .await?;

        write_marker(&version_dir, &result).await?;
        Ok(result)
    }
}
