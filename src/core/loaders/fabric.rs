// ─── Fabric / Quilt ───
// Both publish a launcher profile through the same meta API shape:
// `<meta>/versions/loader/<game>/<loader>/profile/json`.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::context::InstallContext;
use super::installer::{LoaderInstallResult, LoaderInstaller};
use crate::core::downloader::{ignore_chunks, DownloadTask, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::LoaderType;
use crate::core::maven::MavenArtifact;
use crate::core::state::Endpoints;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaProfile {
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<MetaLibrary>,
    pub arguments: Option<MetaArguments>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetaLibrary {
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MetaArguments {
    #[serde(default)]
    pub jvm: Vec<String>,
    #[serde(default)]
    pub game: Vec<String>,
}

pub struct FabricInstaller {
    loader: LoaderType,
}

impl FabricInstaller {
    pub fn fabric() -> Self {
        Self {
            loader: LoaderType::Fabric,
        }
    }

    pub fn quilt() -> Self {
        Self {
            loader: LoaderType::Quilt,
        }
    }

    fn meta_base<'e>(&self, endpoints: &'e Endpoints) -> &'e str {
        match self.loader {
            LoaderType::Quilt => &endpoints.quilt_meta,
            _ => &endpoints.fabric_meta,
        }
    }

    fn default_maven<'e>(&self, endpoints: &'e Endpoints) -> &'e str {
        match self.loader {
            LoaderType::Quilt => &endpoints.quilt_maven,
            _ => &endpoints.fabric_maven,
        }
    }

    async fn fetch_profile(&self, ctx: &InstallContext<'_>) -> LauncherResult<MetaProfile> {
        let url = format!(
            "{}/versions/loader/{}/{}/profile/json",
            self.meta_base(ctx.endpoints).trim_end_matches('/'),
            ctx.minecraft_version,
            ctx.loader_version
        );

        let profile: MetaProfile = ctx.fetch.fetch_json(FetchRequest::get(&url)).await.map_err(
            |e| match e {
                LauncherError::HttpStatus { status, .. } => LauncherError::Loader(format!(
                    "{} meta returned HTTP {} for {}",
                    self.loader, status, url
                )),
                other => other,
            },
        )?;

        if profile.main_class.is_empty() {
            return Err(LauncherError::Loader(format!(
                "{} profile is missing mainClass",
                self.loader
            )));
        }

        Ok(profile)
    }

    /// Download every profile library into the shared store, skipping ones
    /// already present. Returns their relative paths in profile order.
    async fn install_libraries(
        &self,
        profile: &MetaProfile,
        ctx: &InstallContext<'_>,
    ) -> LauncherResult<Vec<String>> {
        let fallback = self.default_maven(ctx.endpoints);
        let mut planned = Vec::with_capacity(profile.libraries.len());
        for lib in &profile.libraries {
            let artifact = MavenArtifact::parse(&lib.name)?;
            let repo = lib.url.as_deref().unwrap_or(fallback);
            let relative = artifact.repository_path();
            let mut task =
                DownloadTask::new(artifact.url(repo), ctx.libs_dir.join(&relative)).size(lib.size);
            if let Some(sha1) = &lib.sha1 {
                task = task.sha1(sha1.clone());
            }
            planned.push((relative, task));
        }

        let fetch = ctx.fetch;
        let results = stream::iter(planned.clone())
            .map(move |(relative, task)| async move {
                if tokio::fs::try_exists(&task.dest).await.unwrap_or(false) {
                    debug!("Library already present: {}", relative);
                    return Ok(());
                }
                fetch.download(&task, &ignore_chunks).await.map(|_| ())
            })
            .buffer_unordered(8)
            .collect::<Vec<LauncherResult<()>>>()
            .await;

        for result in results {
            result?;
        }

        Ok(planned.into_iter().map(|(relative, _)| relative).collect())
    }
}

#[async_trait]
impl LoaderInstaller for FabricInstaller {
    async fn install(&self, ctx: InstallContext<'_>) -> LauncherResult<LoaderInstallResult> {
        info!(
            "Installing {} {} for Minecraft {}",
            self.loader, ctx.loader_version, ctx.minecraft_version
        );

        let profile = self.fetch_profile(&ctx).await?;
        let libraries = self.install_libraries(&profile, &ctx).await?;

        let (extra_jvm_args, extra_game_args) = match profile.arguments {
            Some(args) => (args.jvm, args.game),
            None => (vec![], vec![]),
        };

        info!("{} installed successfully", self.loader);

        Ok(LoaderInstallResult {
            loader: self.loader,
            loader_version: ctx.loader_version.to_string(),
            main_class: profile.main_class,
            extra_jvm_args,
            extra_game_args,
            libraries,
        })
    }
}
