//! Utility functions for edition naming, text normalization, and file system checks.
//!
//! This module provides helpers used throughout the application:
//! - Edition classification from the local time of day
//! - The plain-text normalizer shared by every extraction tier
//! - String truncation for logging
//! - File system validation for output directories

use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static SCRIPT_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Classify a local time into the edition label used in output file names.
///
/// Anything before 13:00 is the `"morning"` edition, the rest is `"evening"`.
pub fn edition_for(time: NaiveTime) -> &'static str {
    if time.hour() < 13 { "morning" } else { "evening" }
}

/// Reduce an HTML fragment (or already-plain text) to a single line of text.
///
/// Contract:
/// - `<script>`, `<style>` and comments are removed with their content
/// - every other tag becomes a space
/// - common named entities and all numeric entities are decoded
/// - runs of whitespace (including non-breaking spaces) collapse to one space
/// - the result is trimmed
///
/// Paragraph breaks are not preserved; callers that need structure must split
/// before normalizing.
pub fn plain_text(html: &str) -> String {
    let without_blocks = SCRIPT_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_blocks, " ");
    let decoded = decode_entities(&without_tags);
    collapse_whitespace(&decoded)
}

/// Collapse all whitespace runs to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Decode the HTML entities that show up in feed summaries and article text.
/// Unknown named entities are left untouched.
pub fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "laquo" => Some('«'),
                    "raquo" => Some('»'),
                    "ndash" => Some('–'),
                    "mdash" => Some('—'),
                    "hellip" => Some('…'),
                    "iexcl" => Some('¡'),
                    "iquest" => Some('¿'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended. Never splits a UTF-8 character.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and deletes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = Path::new(path).join(".headline_digest_probe");
    fs::write(&probe, b"").await?;
    fs::remove_file(&probe).await?;
    info!("Output directory is writable");
    Ok(())
}
