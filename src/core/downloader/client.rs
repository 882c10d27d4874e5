use std::path::{Path, PathBuf};

use futures_util::stream::{self, Stream, StreamExt};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha1::{Digest, Sha1};
use sha2::Sha512;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::progress::ChunkProgress;
use super::retry::{is_retryable_status, with_retries, AttemptError, RetryPolicy};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

/// Progress granularity for streamed bodies.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Suffix for in-flight downloads; never trusted on a later attempt.
const PARTIAL_SUFFIX: &str = "part";

/// A single HTTP request the fetch client knows how to replay.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: String,
    body: Option<serde_json::Value>,
    bearer: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn post_json<B: Serialize>(url: impl Into<String>, body: &B) -> LauncherResult<Self> {
        Ok(Self {
            method: Method::POST,
            url: url.into(),
            body: Some(serde_json::to_value(body)?),
            bearer: None,
        })
    }

    /// Append URL-encoded query parameters.
    pub fn query<K, V>(mut self, params: &[(K, V)]) -> LauncherResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = reqwest::Url::parse(&self.url)
            .map_err(|e| LauncherError::Other(format!("Invalid URL {}: {}", self.url, e)))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
        self.url = url.to_string();
        Ok(self)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Content hash a download is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedHash {
    Sha1(String),
    Sha512(String),
}

impl ExpectedHash {
    fn algorithm(&self) -> &'static str {
        match self {
            ExpectedHash::Sha1(_) => "sha1",
            ExpectedHash::Sha512(_) => "sha512",
        }
    }

    fn expected(&self) -> &str {
        match self {
            ExpectedHash::Sha1(h) | ExpectedHash::Sha512(h) => h,
        }
    }

    fn hasher(&self) -> HashState {
        match self {
            ExpectedHash::Sha1(_) => HashState::Sha1(Sha1::new()),
            ExpectedHash::Sha512(_) => HashState::Sha512(Sha512::new()),
        }
    }
}

enum HashState {
    Sha1(Sha1),
    Sha512(Sha512),
}

impl HashState {
    fn update(&mut self, data: &[u8]) {
        match self {
            HashState::Sha1(h) => h.update(data),
            HashState::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            HashState::Sha1(h) => hex::encode(h.finalize()),
            HashState::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// A single file to download with optional hash and size validation.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    pub expected_hash: Option<ExpectedHash>,
    pub expected_size: Option<u64>,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            expected_hash: None,
            expected_size: None,
        }
    }

    pub fn sha1(mut self, hash: impl Into<String>) -> Self {
        self.expected_hash = Some(ExpectedHash::Sha1(hash.into()));
        self
    }

    pub fn sha512(mut self, hash: impl Into<String>) -> Self {
        self.expected_hash = Some(ExpectedHash::Sha512(hash.into()));
        self
    }

    pub fn size(mut self, size: Option<u64>) -> Self {
        self.expected_size = size;
        self
    }

    pub fn file_name(&self) -> String {
        self.dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Retrying HTTP client with streaming, hash-verified downloads.
pub struct FetchClient {
    client: Client,
    policy: RetryPolicy,
    /// Maximum number of parallel downloads in a batch.
    concurrency: usize,
}

impl FetchClient {
    pub fn new(policy: RetryPolicy) -> LauncherResult<Self> {
        Ok(Self::with_client(build_http_client()?, policy))
    }

    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            concurrency: 8,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    // ── Plain requests ──────────────────────────────────

    async fn send(&self, request: &FetchRequest) -> LauncherResult<reqwest::Response> {
        with_retries(&self.policy, &request.url, || async move {
            let mut builder = self.client.request(request.method.clone(), &request.url);
            if let Some(token) = &request.bearer {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_builder() {
                    AttemptError::Fatal(LauncherError::Http(e))
                } else {
                    AttemptError::Retryable(e.to_string())
                }
            })?;

            let status = response.status();
            if status.is_success() {
                Ok(response)
            } else if is_retryable_status(status) {
                Err(AttemptError::Retryable(format!("HTTP {}", status.as_u16())))
            } else {
                Err(AttemptError::Fatal(LauncherError::HttpStatus {
                    url: request.url.clone(),
                    status: status.as_u16(),
                }))
            }
        })
        .await
    }

    pub async fn fetch(&self, request: FetchRequest) -> LauncherResult<Vec<u8>> {
        let response = self.send(&request).await?;
        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), request.url);
        Ok(bytes.to_vec())
    }

    pub async fn fetch_text(&self, request: FetchRequest) -> LauncherResult<String> {
        let bytes = self.fetch(request).await?;
        String::from_utf8(bytes).map_err(|e| LauncherError::Other(format!("Invalid UTF-8 body: {e}")))
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, request: FetchRequest) -> LauncherResult<T> {
        let bytes = self.fetch(request).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ── Streaming ───────────────────────────────────────

    async fn open_stream(
        &self,
        request: &FetchRequest,
    ) -> LauncherResult<(Option<u64>, impl Stream<Item = Result<impl AsRef<[u8]>, reqwest::Error>>)> {
        let response = self.send(request).await?;
        Ok((response.content_length(), response.bytes_stream()))
    }

    /// Stream the body, calling `on_chunk` for every 8 KiB piece. Returns the total byte count.
    pub async fn fetch_streaming<F>(&self, request: FetchRequest, mut on_chunk: F) -> LauncherResult<u64>
    where
        F: FnMut(&[u8], ChunkProgress) -> LauncherResult<()>,
    {
        let (total_bytes, body) = self.open_stream(&request).await?;
        let mut body = std::pin::pin!(body);
        let mut bytes_so_far = 0u64;

        while let Some(item) = body.next().await {
            let bytes = item?;
            for piece in bytes.as_ref().chunks(CHUNK_SIZE) {
                bytes_so_far += piece.len() as u64;
                on_chunk(
                    piece,
                    ChunkProgress {
                        chunk_len: piece.len() as u64,
                        bytes_so_far,
                        total_bytes,
                    },
                )?;
            }
        }

        Ok(bytes_so_far)
    }

    // ── Verified downloads ──────────────────────────────

    /// Download `task.dest` through a `.part` file, verifying size and hash
    /// before the final rename. A mismatch deletes the temp file and fails
    /// with `Integrity`; it is never retried.
    pub async fn download(
        &self,
        task: &DownloadTask,
        on_chunk: &(dyn Fn(ChunkProgress) + Send + Sync),
    ) -> LauncherResult<u64> {
        if let Some(parent) = task.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let temp = partial_path(&task.dest);
        let written = match self.write_verified(task, &temp, on_chunk).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&temp, &task.dest)
            .await
            .map_err(|e| LauncherError::io(&task.dest, e))?;

        debug!("Downloaded: {} -> {:?}", task.url, task.dest);
        Ok(written)
    }

    async fn write_verified(
        &self,
        task: &DownloadTask,
        temp: &Path,
        on_chunk: &(dyn Fn(ChunkProgress) + Send + Sync),
    ) -> LauncherResult<u64> {
        let request = FetchRequest::get(task.url.clone());
        let (total_bytes, body) = self.open_stream(&request).await?;
        let mut body = std::pin::pin!(body);
        let total_bytes = total_bytes.or(task.expected_size);
        let mut hasher = task.expected_hash.as_ref().map(ExpectedHash::hasher);
        let mut written = 0u64;

        // File::create truncates whatever an abandoned attempt left behind.
        {
            let mut file = tokio::fs::File::create(temp)
                .await
                .map_err(|e| LauncherError::io(temp, e))?;

            while let Some(item) = body.next().await {
                let bytes = item?;
                for piece in bytes.as_ref().chunks(CHUNK_SIZE) {
                    if let Some(h) = hasher.as_mut() {
                        h.update(piece);
                    }
                    file.write_all(piece)
                        .await
                        .map_err(|e| LauncherError::io(temp, e))?;
                    written += piece.len() as u64;
                    on_chunk(ChunkProgress {
                        chunk_len: piece.len() as u64,
                        bytes_so_far: written,
                        total_bytes,
                    });
                }
            }

            file.flush().await.map_err(|e| LauncherError::io(temp, e))?;
            // file is dropped here; Windows refuses to rename open handles
        }

        if let Some(expected) = task.expected_size {
            if expected != written {
                return Err(LauncherError::Integrity {
                    path: task.dest.clone(),
                    algorithm: "size",
                    expected: expected.to_string(),
                    actual: written.to_string(),
                });
            }
        }

        if let (Some(expected), Some(state)) = (task.expected_hash.as_ref(), hasher) {
            let actual = state.finalize_hex();
            if !actual.eq_ignore_ascii_case(expected.expected()) {
                warn!("{} mismatch for {:?}", expected.algorithm(), task.dest);
                return Err(LauncherError::Integrity {
                    path: task.dest.clone(),
                    algorithm: expected.algorithm(),
                    expected: expected.expected().to_string(),
                    actual,
                });
            }
        }

        Ok(written)
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many files concurrently using `buffer_unordered`.
    ///
    /// Every task runs to completion; returns the ones that failed.
    pub async fn download_batch(
        &self,
        tasks: Vec<DownloadTask>,
        on_chunk: &(dyn Fn(ChunkProgress) + Send + Sync),
    ) -> Vec<(DownloadTask, LauncherError)> {
        info!(
            "Starting batch download: {} files, concurrency={}",
            tasks.len(),
            self.concurrency
        );

        let results: Vec<_> = stream::iter(tasks)
            .map(|task| async move {
                let result = self.download(&task, on_chunk).await;
                (task, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(task, result)| result.err().map(|e| (task, e)))
            .collect()
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

/// SHA-1 of a file already on disk.
pub async fn sha1_file(path: &Path) -> LauncherResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    let mut hasher = Sha1::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
