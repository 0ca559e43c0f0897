//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use cardfetch_core::{Language, Source};

/// Scrapes card catalogs and downloads card images.
#[derive(Parser, Debug)]
#[command(
    name = "cardfetch",
    version,
    about = "Download trading card images from online catalogs",
    long_about = "Discovers card sets on a catalog site, extracts card records, downloads \
        the card images into a per-set directory tree, and bundles the result into a zip \
        archive. Runs are resumable: completed downloads are recorded in a progress file \
        and skipped on the next run."
)]
pub struct Cli {
    /// Catalog site to scrape
    #[arg(long, value_enum, default_value_t = Source::Pokellector)]
    pub source: Source,

    /// Catalog language
    #[arg(long, value_enum, default_value_t = Language::En)]
    pub language: Language,

    /// Output directory for downloaded images
    #[arg(short, long, default_value = "pokemon_cards")]
    pub output: PathBuf,

    /// Only process sets whose code or name matches (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub sets: Vec<String>,

    /// Concurrent image downloads
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: u8,

    /// Minimum delay between requests to the same domain, in milliseconds
    /// (0 disables pacing)
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Skip creating the zip archive after downloading
    #[arg(long)]
    pub no_archive: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
