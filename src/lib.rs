//! Cardfetch Core Library
//!
//! This library provides the core functionality for the cardfetch tool,
//! which retrieves trading-card catalog data (set listings, card metadata,
//! card images) from public catalog sites and maintains a resumable local
//! image archive.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`model`] - Canonical record types (sets, cards, download identities)
//! - [`fetch`] - HTTP page client with retry/backoff and politeness pacing
//! - [`extract`] - Heuristic field-extraction cascades over parsed HTML
//! - [`adapter`] - Site profiles and the discovery/pagination engine
//! - [`download`] - Idempotent image store with persisted progress
//! - [`archive`] - Zip bundling of the downloaded image tree
//! - [`pipeline`] - End-to-end driver with partial-failure isolation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod archive;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod pipeline;

// Re-export commonly used types
pub use adapter::{SiteAdapter, SiteProfile};
pub use archive::{ArchiveError, create_archive};
pub use download::{DownloadError, DownloadOutcome, ImageStore, ProgressLog};
pub use fetch::{FetchError, PageClient, RateLimiter, RetryPolicy};
pub use model::{CardRecord, Language, SetDescriptor, Source};
pub use pipeline::{Pipeline, PipelineConfig, RunSummary};
