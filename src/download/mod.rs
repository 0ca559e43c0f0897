//! Resumable card image downloads.
//!
//! The [`ImageStore`] owns the output tree and the progress log. Every
//! download is checked against the progress set first (a hit makes zero
//! network calls), then against an already-present file on disk, and only
//! then fetched, streamed to disk, and recorded. Transient failures retry
//! with doubling backoff; an empty response body is treated as a failure so
//! a zero-byte file can never survive.

mod error;
mod filename;
mod progress;

pub use error::DownloadError;
pub use filename::{
    IMAGE_EXTENSIONS, card_file_name, card_output_path, extension_from_url, sanitize_component,
};
pub use progress::{PROGRESS_FILE_NAME, ProgressLog};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::fetch::RateLimiter;
use crate::model::CardRecord;

/// Files at least this large are assumed to be complete prior downloads.
pub const SKIP_SIZE_THRESHOLD: u64 = 1024;

/// Download attempts per image (first try plus two retries).
const MAX_ATTEMPTS: u32 = 3;

/// Base backoff between image retry attempts (1s, then 2s, then 4s).
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Result of a single card download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The image was fetched and written to the given path.
    Downloaded(PathBuf),
    /// The progress log already records this card; nothing was fetched.
    SkippedRecorded,
    /// A plausible file already exists on disk; nothing was fetched.
    SkippedExisting,
}

/// Downloads card images into the output tree, tracking progress on disk.
///
/// Shared across download workers behind an `Arc`; the progress log is the
/// single piece of mutable state and sits behind an async mutex.
pub struct ImageStore {
    root: PathBuf,
    client: Client,
    limiter: Arc<RateLimiter>,
    progress: Mutex<ProgressLog>,
    retry_base_delay: Duration,
}

impl ImageStore {
    /// Opens an image store rooted at `root`, loading any existing progress.
    ///
    /// The reqwest client is shared with the page fetcher so both kinds of
    /// traffic use one connection pool.
    #[must_use]
    pub fn new(root: PathBuf, client: Client, limiter: Arc<RateLimiter>) -> Self {
        let progress = ProgressLog::load(&root);
        Self {
            root,
            client,
            limiter,
            progress: Mutex::new(progress),
            retry_base_delay: RETRY_BASE_DELAY,
        }
    }

    /// Overrides the retry backoff base (tests shrink it).
    #[must_use]
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Output root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of identities currently recorded in the progress log.
    pub async fn recorded_count(&self) -> usize {
        self.progress.lock().await.len()
    }

    /// Writes the progress log to disk.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::State`] when the log cannot be written.
    pub async fn flush_progress(&self) -> Result<(), DownloadError> {
        self.progress.lock().await.flush()
    }

    /// Downloads one card image, honoring the progress log and existing
    /// files.
    ///
    /// # Errors
    ///
    /// Non-fatal errors mean this card failed; only [`DownloadError::State`]
    /// (progress flush failure) should abort the run.
    #[instrument(skip(self, record), fields(id = %record.download_id()))]
    pub async fn download(&self, record: &CardRecord) -> Result<DownloadOutcome, DownloadError> {
        let id = record.download_id();
        if self.progress.lock().await.contains(&id) {
            debug!("already recorded, skipping");
            return Ok(DownloadOutcome::SkippedRecorded);
        }

        let path = card_output_path(&self.root, record);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        if let Ok(metadata) = tokio::fs::metadata(&path).await {
            if metadata.len() >= SKIP_SIZE_THRESHOLD {
                debug!(path = %path.display(), size = metadata.len(), "file exists, skipping");
                self.record_success(id).await?;
                return Ok(DownloadOutcome::SkippedExisting);
            }
        }

        if Url::parse(&record.image_url).is_err() {
            return Err(DownloadError::invalid_url(&record.image_url));
        }

        let mut attempt: u32 = 1;
        loop {
            self.limiter.acquire(&record.image_url).await;
            match self.stream_to_file(&record.image_url, &path).await {
                Ok(bytes) => {
                    info!(path = %path.display(), bytes, "image downloaded");
                    self.record_success(id).await?;
                    return Ok(DownloadOutcome::Downloaded(path));
                }
                Err(error) => {
                    remove_partial(&path).await;
                    if !is_transient(&error) || attempt >= MAX_ATTEMPTS {
                        warn!(error = %error, attempt, "image download failed");
                        return Err(error);
                    }
                    let delay = self.retry_base_delay * 2_u32.pow(attempt - 1);
                    warn!(
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "image download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Records a completed identity and flushes the log immediately.
    async fn record_success(&self, id: String) -> Result<(), DownloadError> {
        let mut progress = self.progress.lock().await;
        progress.insert(id);
        progress.flush()
    }

    /// Streams the response body to `path`, returning the byte count.
    ///
    /// A successful response with an empty body is an error; the caller
    /// removes the file and may retry.
    async fn stream_to_file(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    DownloadError::timeout(url)
                } else {
                    DownloadError::network(url, e)
                }
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(path, e))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| DownloadError::io(path, e))?;
        if written == 0 {
            return Err(DownloadError::empty_body(url));
        }
        Ok(written)
    }
}

/// Whether a download failure is worth another attempt.
fn is_transient(error: &DownloadError) -> bool {
    match error {
        DownloadError::Network { .. }
        | DownloadError::Timeout { .. }
        | DownloadError::EmptyBody { .. } => true,
        DownloadError::HttpStatus { status, .. } => {
            matches!(status, 429 | 500 | 502 | 503 | 504 | 522 | 524)
        }
        DownloadError::InvalidUrl { .. }
        | DownloadError::Io { .. }
        | DownloadError::State { .. } => false,
    }
}

/// Removes a partial file, ignoring failures (it may not exist).
async fn remove_partial(path: &Path) {
    if tokio::fs::remove_file(path).await.is_ok() {
        debug!(path = %path.display(), "removed partial file");
    }
}
