//! Append-only CSV log of every captured item across runs.
//!
//! Rows are keyed on `(topic, title, link)`. Merging a run into an existing
//! log keeps the first occurrence of each key, so rerunning a day does not
//! duplicate rows and the original capture time is preserved.

use crate::models::EnrichedItem;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// One row of the log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub topic: String,
    pub title: String,
    pub link: String,
    pub domain: String,
    pub captured_at: String,
}

impl From<&EnrichedItem> for LogRow {
    fn from(entry: &EnrichedItem) -> Self {
        let item = &entry.item;
        Self {
            topic: item.topic.clone(),
            title: item.title.clone(),
            link: item.link.clone(),
            domain: item.domain.clone(),
            captured_at: item.captured_at.to_rfc3339(),
        }
    }
}

fn read_rows(path: &Path) -> Result<Vec<LogRow>, Box<dyn Error>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<LogRow>, _>>()?;
    Ok(rows)
}

/// Merge `items` into the log at `path`, creating it if needed.
///
/// # Arguments
///
/// * `items` - This run's items, in digest order
/// * `path` - Location of the CSV log
///
/// # Returns
///
/// The number of rows the file holds afterwards. Nothing is written when
/// `items` is empty, and `0` is returned.
///
/// # Errors
///
/// Returns an error if the existing log cannot be read or parsed, or the
/// merged log cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), new = items.len()))]
pub fn append_log(items: &[EnrichedItem], path: &Path) -> Result<usize, Box<dyn Error>> {
    if items.is_empty() {
        info!("No items to log");
        return Ok(0);
    }

    let existing = read_rows(path)?;
    let before = existing.len();
    let merged: Vec<LogRow> = existing
        .into_iter()
        .chain(items.iter().map(LogRow::from))
        .unique_by(|r| (r.topic.clone(), r.title.clone(), r.link.clone()))
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    for row in &merged {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(before, after = merged.len(), "Updated CSV log");
    Ok(merged.len())
}
