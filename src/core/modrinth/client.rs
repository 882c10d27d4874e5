// ─── Mod Registry Client ───
// Thin typed wrapper over the Modrinth v2 REST API.

use std::sync::Arc;

use tracing::debug;

use super::models::{Project, ProjectVersion, SearchResponse};
use crate::core::downloader::{FetchClient, FetchRequest};
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub game_version: Option<String>,
    pub loader: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 20,
            ..Default::default()
        }
    }

    /// `[["project_type:mod"], ["versions:X"], ["categories:fabric"]]`
    fn facets(&self) -> String {
        let mut facets = vec![vec!["project_type:mod".to_string()]];
        if let Some(version) = &self.game_version {
            facets.push(vec![format!("versions:{}", version)]);
        }
        if let Some(loader) = &self.loader {
            facets.push(vec![format!("categories:{}", loader)]);
        }
        serde_json::Value::from(facets).to_string()
    }
}

pub struct RegistryClient {
    fetch: Arc<FetchClient>,
    base_url: String,
}

impl RegistryClient {
    pub fn new(fetch: Arc<FetchClient>, base_url: impl Into<String>) -> Self {
        Self {
            fetch,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> LauncherResult<SearchResponse> {
        let request = FetchRequest::get(format!("{}/search", self.base_url)).query(&[
            ("query", query.query.clone()),
            ("facets", query.facets()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ])?;
        let page: SearchResponse = self.fetch.fetch_json(request).await?;
        debug!(
            "Search {:?}: {} hits of {}",
            query.query,
            page.hits.len(),
            page.total_hits
        );
        Ok(page)
    }

    pub async fn project(&self, project_id: &str) -> LauncherResult<Project> {
        let url = format!("{}/project/{}", self.base_url, project_id);
        self.fetch
            .fetch_json(FetchRequest::get(url))
            .await
            .map_err(|e| not_found_as("project", project_id, e))
    }

    /// Versions of a project, optionally filtered server-side.
    pub async fn versions(
        &self,
        project_id: &str,
        game_version: Option<&str>,
        loader: Option<&str>,
    ) -> LauncherResult<Vec<ProjectVersion>> {
        let mut params = Vec::new();
        if let Some(v) = game_version {
            params.push(("game_versions", format!("[\"{}\"]", v)));
        }
        if let Some(l) = loader {
            params.push(("loaders", format!("[\"{}\"]", l)));
        }
        let url = format!("{}/project/{}/version", self.base_url, project_id);
        let request = FetchRequest::get(url).query(&params)?;
        self.fetch
            .fetch_json(request)
            .await
            .map_err(|e| not_found_as("project", project_id, e))
    }

    pub async fn version(&self, version_id: &str) -> LauncherResult<ProjectVersion> {
        let url = format!("{}/version/{}", self.base_url, version_id);
        self.fetch
            .fetch_json(FetchRequest::get(url))
            .await
            .map_err(|e| not_found_as("mod version", version_id, e))
    }
}

fn not_found_as(kind: &'static str, id: &str, err: LauncherError) -> LauncherError {
    if err.is_http_not_found() {
        LauncherError::not_found(kind, id)
    } else {
        err
    }
}
