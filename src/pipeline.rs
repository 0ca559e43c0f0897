//! End-to-end scraping pipeline.
//!
//! One run walks discovery, extraction, download, and archiving in order.
//! Discovery and extraction are sequential (they are cheap and politeness-
//! limited anyway); downloads within a set run on a bounded concurrent
//! worker pool. Ctrl-C is honored at set boundaries so the progress log is
//! always consistent when the process exits.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::adapter::SiteAdapter;
use crate::archive::create_archive;
use crate::download::{DownloadError, ImageStore};
use crate::fetch::{FetchError, PageClient};
use crate::model::{Language, SetDescriptor, Source};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Catalog site to scrape.
    pub source: Source,
    /// Catalog language to scrape.
    pub language: Language,
    /// Root directory for downloaded images and the progress log.
    pub output_root: PathBuf,
    /// Set name or code filters; empty means all sets.
    pub set_filter: Vec<String>,
    /// Concurrent download workers.
    pub concurrency: usize,
    /// Whether to bundle the output tree into a zip archive at the end.
    pub make_archive: bool,
}

/// Final accounting for a pipeline run. Always produced, even on partial
/// failure or cancellation.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Sets discovered on the catalog index.
    pub sets_found: usize,
    /// Sets actually processed (after filtering and cancellation).
    pub sets_processed: usize,
    /// Card records extracted across all processed sets.
    pub cards_discovered: usize,
    /// Cards downloaded or verified present (including resumption skips).
    pub cards_downloaded: usize,
    /// Cards that failed after retries.
    pub failed_downloads: usize,
    /// Path of the created archive, if one was made.
    pub archive: Option<PathBuf>,
    /// Why the archive was not created, when one was requested and failed.
    pub archive_failure: Option<String>,
    /// Whether the run was cut short by Ctrl-C.
    pub cancelled: bool,
}

/// Orchestrates one scrape-and-download run.
pub struct Pipeline {
    config: PipelineConfig,
    adapter: SiteAdapter,
    store: Arc<ImageStore>,
}

impl Pipeline {
    /// Builds a pipeline for the configured site and language.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the site profile's base URL is invalid.
    pub fn new(config: PipelineConfig, client: PageClient) -> Result<Self, FetchError> {
        let adapter = SiteAdapter::new(config.source, config.language, client.clone())?;
        let store = Arc::new(ImageStore::new(
            config.output_root.clone(),
            client.inner().clone(),
            client.limiter(),
        ));
        Ok(Self {
            config,
            adapter,
            store,
        })
    }

    /// Builds a pipeline from pre-assembled parts (tests point the adapter
    /// at a mock server).
    #[must_use]
    pub fn with_parts(config: PipelineConfig, adapter: SiteAdapter, store: Arc<ImageStore>) -> Self {
        Self {
            config,
            adapter,
            store,
        }
    }

    /// Runs the full pipeline: discover, extract, download, archive.
    ///
    /// Per-card and per-set failures are absorbed and counted; the run only
    /// fails outright when the output directory cannot be created or the
    /// progress log cannot be persisted.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] on output-directory or progress-state
    /// failures.
    pub async fn run(&self) -> Result<RunSummary, DownloadError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        spawn_cancel_listener(Arc::clone(&cancelled));
        self.run_with_cancel(cancelled).await
    }

    /// Runs the pipeline against an externally controlled cancellation flag.
    ///
    /// [`run`](Self::run) wires this to Ctrl-C; tests drive the flag
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] on output-directory or progress-state
    /// failures.
    pub async fn run_with_cancel(
        &self,
        cancelled: Arc<AtomicBool>,
    ) -> Result<RunSummary, DownloadError> {
        tokio::fs::create_dir_all(&self.config.output_root)
            .await
            .map_err(|e| DownloadError::io(&self.config.output_root, e))?;

        let mut summary = RunSummary::default();

        let sets = self.adapter.discover_sets().await;
        summary.sets_found = sets.len();
        let selected: Vec<&SetDescriptor> = sets
            .iter()
            .filter(|set| set_matches(set, &self.config.set_filter))
            .collect();
        info!(
            found = summary.sets_found,
            selected = selected.len(),
            "set discovery complete"
        );

        for set in selected {
            if cancelled.load(Ordering::Relaxed) {
                warn!("cancellation requested, stopping before next set");
                summary.cancelled = true;
                break;
            }

            let cards = self.adapter.cards_in_set(set).await;
            summary.cards_discovered += cards.len();
            summary.sets_processed += 1;
            if cards.is_empty() {
                warn!(set = %set.name, "no cards found in set");
                continue;
            }

            let bar = download_bar(&set.code, cards.len() as u64);
            let mut downloads = futures_util::stream::iter(cards.iter().map(|card| {
                let store = Arc::clone(&self.store);
                async move { store.download(card).await }
            }))
            .buffer_unordered(self.config.concurrency.max(1));

            while let Some(result) = downloads.next().await {
                bar.inc(1);
                match result {
                    Ok(_) => summary.cards_downloaded += 1,
                    Err(error) if error.is_fatal() => {
                        bar.abandon();
                        error!(error = %error, "fatal state error, aborting run");
                        return Err(error);
                    }
                    Err(error) => {
                        warn!(error = %error, "card download failed");
                        summary.failed_downloads += 1;
                    }
                }
            }
            bar.finish();
        }

        self.store.flush_progress().await?;

        if self.config.make_archive {
            if summary.cancelled {
                summary.archive_failure =
                    Some("run was interrupted before archiving".to_string());
            } else if summary.cards_downloaded > 0 {
                match create_archive(&self.config.output_root) {
                    Ok(path) => summary.archive = Some(path),
                    Err(error) => {
                        warn!(error = %error, "archive creation failed");
                        summary.archive_failure = Some(error.to_string());
                    }
                }
            } else {
                summary.archive_failure = Some("no cards downloaded".to_string());
            }
        }

        log_summary(&summary, self.config.source, self.config.language);
        Ok(summary)
    }
}

/// Whether a set passes the user's `--sets` filter.
///
/// An empty filter selects everything; otherwise a set matches when its code
/// equals an entry or its name contains one, case-insensitively.
fn set_matches(set: &SetDescriptor, filter: &[String]) -> bool {
    if filter.is_empty() {
        return true;
    }
    let code = set.code.to_lowercase();
    let name = set.name.to_lowercase();
    filter.iter().any(|entry| {
        let entry = entry.to_lowercase();
        code == entry || name.contains(&entry)
    })
}

/// Progress bar for one set's downloads.
fn download_bar(set_code: &str, total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map(|s| s.progress_chars("=>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_prefix(set_code.to_string());
    bar
}

/// Flags cancellation on Ctrl-C; the run loop checks at set boundaries.
fn spawn_cancel_listener(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current set");
            flag.store(true, Ordering::Relaxed);
        }
    });
}

/// Final run accounting at info level.
fn log_summary(summary: &RunSummary, source: Source, language: Language) {
    info!(
        source = %source,
        language = %language,
        sets_found = summary.sets_found,
        sets_processed = summary.sets_processed,
        cards_discovered = summary.cards_discovered,
        cards_downloaded = summary.cards_downloaded,
        failed_downloads = summary.failed_downloads,
        archive = summary.archive.as_ref().map(|p| p.display().to_string()),
        cancelled = summary.cancelled,
        "run complete"
    );
}
