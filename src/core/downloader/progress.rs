use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum TransferState {
    InProgress,
    Completed,
    Failed(String),
}

/// Snapshot handed to progress observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadProgress {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub current_file: String,
    /// Human readable step description ("Downloading libraries", ...).
    pub status: String,
    pub state: TransferState,
}

impl DownloadProgress {
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => Some(self.downloaded_bytes as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// Progress of one streaming transfer, reported per 8 KiB chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkProgress {
    /// Size of the chunk that triggered this report.
    pub chunk_len: u64,
    pub bytes_so_far: u64,
    pub total_bytes: Option<u64>,
}

impl ChunkProgress {
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => Some(self.bytes_so_far as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// For downloads nobody watches.
pub fn ignore_chunks(_: ChunkProgress) {}

/// Cloneable sink for progress events. Observers must not block.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sink: Option<Arc<dyn Fn(DownloadProgress) + Send + Sync>>,
}

impl ProgressReporter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(DownloadProgress) + Send + Sync + 'static,
    {
        Self {
            sink: Some(Arc::new(f)),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, progress: DownloadProgress) {
        if let Some(sink) = &self.sink {
            sink(progress);
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_requires_known_length() {
        let known = ChunkProgress {
            chunk_len: 4096,
            bytes_so_far: 4096,
            total_bytes: Some(16384),
        };
        let unknown = ChunkProgress {
            chunk_len: 4096,
            bytes_so_far: 4096,
            total_bytes: None,
        };
        assert_eq!(known.percentage(), Some(25.0));
        assert_eq!(unknown.percentage(), None);
    }
}
