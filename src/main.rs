//! Binary entry point: parse arguments, set up logging, run the pipeline.

mod cli;

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use cardfetch_core::{PageClient, Pipeline, PipelineConfig};

use crate::cli::Cli;

/// Log file written next to the downloaded images.
const LOG_FILE_NAME: &str = "cardfetch.log";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let client = PageClient::new(Duration::from_millis(cli.delay_ms));
    let config = PipelineConfig {
        source: cli.source,
        language: cli.language,
        output_root: cli.output.clone(),
        set_filter: cli.sets.clone(),
        concurrency: usize::from(cli.concurrency),
        make_archive: !cli.no_archive,
    };

    let pipeline = Pipeline::new(config, client).context("failed to initialize pipeline")?;
    let summary = pipeline.run().await.context("run aborted")?;

    println!(
        "\n{} sets found, {} processed; {} cards discovered, {} downloaded, {} failed",
        summary.sets_found,
        summary.sets_processed,
        summary.cards_discovered,
        summary.cards_downloaded,
        summary.failed_downloads,
    );
    if let Some(archive) = &summary.archive {
        println!("archive written to {}", archive.display());
    } else if let Some(reason) = &summary.archive_failure {
        println!("archive not created: {reason}");
    }
    if summary.cancelled {
        println!("run was interrupted; rerun to resume");
    }

    if summary.failed_downloads > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `-v`/`-q`.
/// Output goes to the console and, when the output directory is writable,
/// is teed into `cardfetch.log` inside it.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cli.quiet {
            "error"
        } else {
            match cli.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };
        EnvFilter::new(level)
    });

    let file_layer = open_log_file(&cli.output).map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Arc::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();
}

/// Opens the log file inside the output directory, appending across runs.
///
/// Returns `None` if the directory or file cannot be created; the run then
/// logs to the console only.
fn open_log_file(output: &Path) -> Option<File> {
    if let Err(error) = std::fs::create_dir_all(output) {
        eprintln!("cannot create {}: {error}", output.display());
        return None;
    }
    let path = output.join(LOG_FILE_NAME);
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(error) => {
            eprintln!("cannot open {}: {error}", path.display());
            None
        }
    }
}
