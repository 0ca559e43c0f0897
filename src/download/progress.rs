//! Persistent download progress for resumable runs.
//!
//! The progress log is a JSON file at the output root holding the set of
//! completed download identities. It is read once at startup and flushed
//! after every successful download, so a crash at any point loses at most
//! the in-flight card. A corrupt or missing file degrades to an empty set;
//! the only hard failure is being unable to write it back.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::DownloadError;

/// File name of the progress log inside the output root.
pub const PROGRESS_FILE_NAME: &str = "progress.json";

/// On-disk shape of the progress log.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    downloaded_files: Vec<String>,
}

/// The set of completed download identities, backed by a JSON file.
#[derive(Debug)]
pub struct ProgressLog {
    path: PathBuf,
    entries: HashSet<String>,
}

impl ProgressLog {
    /// Loads the progress log from the output root.
    ///
    /// A missing file starts an empty log; a corrupt file is logged and
    /// treated as empty rather than aborting the run.
    #[must_use]
    pub fn load(output_root: &Path) -> Self {
        let path = output_root.join(PROGRESS_FILE_NAME);
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<ProgressFile>(&contents) {
                Ok(file) => {
                    info!(
                        path = %path.display(),
                        entries = file.downloaded_files.len(),
                        "loaded download progress"
                    );
                    file.downloaded_files.into_iter().collect()
                }
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "progress file is corrupt, starting fresh"
                    );
                    HashSet::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no progress file, starting fresh");
                HashSet::new()
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "could not read progress file, starting fresh"
                );
                HashSet::new()
            }
        };
        Self { path, entries }
    }

    /// Whether a download identity has already completed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains(id)
    }

    /// Records a completed download identity.
    pub fn insert(&mut self, id: String) {
        self.entries.insert(id);
    }

    /// Number of recorded identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the log back to disk.
    ///
    /// Entries are sorted so the file is diffable between runs.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::State`] when the file cannot be written;
    /// callers treat that as fatal because resumability is lost.
    pub fn flush(&self) -> Result<(), DownloadError> {
        let mut downloaded_files: Vec<String> = self.entries.iter().cloned().collect();
        downloaded_files.sort();
        let file = ProgressFile { downloaded_files };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| DownloadError::state(&self.path, std::io::Error::other(e)))?;
        std::fs::write(&self.path, json).map_err(|e| DownloadError::state(&self.path, e))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "progress flushed");
        Ok(())
    }
}
