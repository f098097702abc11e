//! Output generation for Markdown, JSON, and the append-only CSV log.
//!
//! # Submodules
//!
//! - [`markdown`]: renders a [`Digest`](crate::models::Digest) for reading and mailing
//! - [`json`]: serializes the digest for downstream tools
//! - [`log`]: merges captured items into a CSV log keyed on (topic, title, link)
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── digest_log.csv
//! └── 2025-10-09/
//!     ├── digest_morning.md
//!     ├── digest_morning.json
//!     └── .ok
//! ```
//!
//! `.ok` is written last, once every output for the day has been attempted.

pub mod json;
pub mod log;
pub mod markdown;

use crate::models::Digest;
use chrono::NaiveDate;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Base name of per-edition output files.
pub const FILE_PREFIX: &str = "digest";

/// Name of the CSV log at the output root.
pub const LOG_FILE: &str = "digest_log.csv";

/// Per-day output folder, created if missing.
///
/// # Arguments
///
/// * `root` - The output root directory
/// * `date` - Local date of the run
///
/// # Returns
///
/// The path `{root}/{YYYY-MM-DD}`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
#[instrument(level = "info", skip_all, fields(root = %root.display(), %date))]
pub async fn ensure_daily_dir(root: &Path, date: NaiveDate) -> Result<PathBuf, Box<dyn Error>> {
    let dir = root.join(date.format("%Y-%m-%d").to_string());
    fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// File name for one edition's output with the given extension.
pub fn edition_file(edition: &str, ext: &str) -> String {
    format!("{FILE_PREFIX}_{edition}.{ext}")
}

/// Mark the day's folder as complete.
pub async fn write_ok_marker(dir: &Path) -> Result<(), Box<dyn Error>> {
    let path = dir.join(".ok");
    fs::write(&path, "ok").await?;
    info!(path = %path.display(), "Wrote completion marker");
    Ok(())
}

/// Write every output for one run under `root`.
///
/// Markdown, JSON and the CSV log are attempted independently: a failure is
/// logged with `error!` and the remaining outputs still run. The `.ok` marker
/// is written last.
///
/// # Arguments
///
/// * `digest` - The run's digest
/// * `root` - The output root holding daily folders and the CSV log
///
/// # Returns
///
/// The daily folder the outputs were written to.
///
/// # Errors
///
/// Returns an error only if the daily folder or the `.ok` marker cannot be
/// written.
#[instrument(level = "info", skip_all, fields(root = %root.display()))]
pub async fn write_all(digest: &Digest, root: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let daily_dir = ensure_daily_dir(root, digest.local_date).await?;

    if let Err(e) = markdown::write_markdown(digest, &daily_dir).await {
        error!(error = %e, "Failed to write Markdown digest");
    }

    if let Err(e) = json::write_digest(digest, &daily_dir).await {
        error!(error = %e, "Failed to write JSON digest");
    }

    if let Err(e) = log::append_log(&digest.items, &root.join(LOG_FILE)) {
        error!(error = %e, "Failed to update CSV log");
    }

    write_ok_marker(&daily_dir).await?;
    Ok(daily_dir)
}
