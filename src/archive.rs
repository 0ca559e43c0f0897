//! Zip archiving of the downloaded image tree.
//!
//! Runs after the download phase: walks the output root, bundles every image
//! file into `pokemon_cards.zip` next to the root, and leaves state files
//! (anything without an image extension) out. Archive failure never undoes
//! the downloads; the pipeline reports it and keeps the tree.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::download::IMAGE_EXTENSIONS;

/// File name of the produced archive.
pub const ARCHIVE_FILE_NAME: &str = "pokemon_cards.zip";

/// Errors that can occur while building the archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Filesystem error while walking the tree or writing the archive.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Zip encoding error.
    #[error("zip error writing {path}: {source}")]
    Zip {
        /// The archive path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The output tree contained no image files to bundle.
    #[error("no images found under {root}")]
    NoImages {
        /// The output root that was scanned.
        root: PathBuf,
    },
}

impl ArchiveError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}

/// Bundles every image under `output_root` into a zip archive placed next to
/// the root directory.
///
/// Entry names are root-relative with forward slashes, so the archive
/// unpacks to the same layout on any platform.
///
/// # Errors
///
/// Returns [`ArchiveError::NoImages`] when the tree holds nothing to bundle,
/// or an I/O or zip error if writing fails.
pub fn create_archive(output_root: &Path) -> Result<PathBuf, ArchiveError> {
    let mut images = Vec::new();
    collect_images(output_root, &mut images)?;
    if images.is_empty() {
        return Err(ArchiveError::NoImages {
            root: output_root.to_path_buf(),
        });
    }
    images.sort();

    let archive_path = output_root
        .parent()
        .unwrap_or(output_root)
        .join(ARCHIVE_FILE_NAME);
    info!(
        path = %archive_path.display(),
        files = images.len(),
        "creating archive"
    );

    let file =
        File::create(&archive_path).map_err(|e| ArchiveError::io(&archive_path, e))?;
    let mut writer = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for image in &images {
        let entry_name = entry_name_for(output_root, image);
        debug!(entry = %entry_name, "adding to archive");
        writer
            .start_file(entry_name, options)
            .map_err(|e| ArchiveError::zip(&archive_path, e))?;
        let mut input = File::open(image).map_err(|e| ArchiveError::io(image, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| ArchiveError::io(image, e))?;
    }

    writer
        .finish()
        .map_err(|e| ArchiveError::zip(&archive_path, e))?;
    info!(path = %archive_path.display(), "archive complete");
    Ok(archive_path)
}

/// Recursively collects image files under `dir`.
fn collect_images(dir: &Path, images: &mut Vec<PathBuf>) -> Result<(), ArchiveError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_images(&path, images)?;
        } else if is_image(&path) {
            images.push(path);
        }
    }
    Ok(())
}

/// Whether a path has a recognized image extension.
fn is_image(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Root-relative, forward-slash entry name for an archived file.
fn entry_name_for(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
