pub mod client;
pub mod progress;
pub mod retry;

pub use client::{sha1_file, DownloadTask, ExpectedHash, FetchClient, FetchRequest, CHUNK_SIZE};
pub use progress::{ignore_chunks, ChunkProgress, DownloadProgress, ProgressReporter, TransferState};
pub use retry::{with_retries, AttemptError, RetryPolicy};
