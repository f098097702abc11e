//! JSON output of the run's digest.
//!
//! The file sits next to the Markdown edition in the daily folder:
//! `{daily_dir}/digest_{edition}.json`.

use super::edition_file;
use crate::models::Digest;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Write a [`Digest`] as pretty-printed JSON into `daily_dir`.
///
/// # Arguments
///
/// * `digest` - The digest to serialize
/// * `daily_dir` - Existing per-day output folder
///
/// # Returns
///
/// The path written, `{daily_dir}/digest_{edition}.json`.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
#[instrument(level = "info", skip_all, fields(daily_dir = %daily_dir.display()))]
pub async fn write_digest(digest: &Digest, daily_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(digest)?;
    let path = daily_dir.join(edition_file(&digest.edition, "json"));

    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), items = digest.items_count(), "Wrote JSON digest");

    Ok(path)
}
