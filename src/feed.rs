//! RSS 2.0 / Atom parsing into [`RawEntry`] values.
//!
//! Only the fields the pipeline reads are extracted: title, link, summary,
//! the publication dates and the RSS `<source url>` publisher hint. Namespace
//! prefixes are ignored, so `dc:date` and `atom:link` inside an RSS item are
//! picked up by their local names.
//!
//! # Encoding
//!
//! Bodies are read as UTF-8. A body that is not valid UTF-8 and declares
//! `ISO-8859-1` (or `latin1`, `windows-1252`) in its prolog is decoded byte
//! for byte as Latin-1; any other invalid input is decoded lossily.

use crate::error::FeedError;
use crate::models::RawEntry;
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::bytes::Regex;
use std::borrow::Cow;

static DECLARED_ENCODING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*<\?xml[^>]*encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#).unwrap());

/// Parse a feed body. An XML document whose root is not `rss`, `feed` or
/// `RDF` is rejected, which catches HTML error pages served with status 200.
pub fn parse_feed(body: &[u8]) -> Result<Vec<RawEntry>, FeedError> {
    let text = decode_body(body);
    let xml = text.trim_start_matches('\u{feff}');

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut saw_root = false;
    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    // Child element of the current item whose text is being collected.
    let mut field: Option<String> = None;
    let mut buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if !saw_root {
                    saw_root = true;
                    if !matches!(name.as_str(), "rss" | "feed" | "RDF") {
                        return Err(FeedError::NotAFeed);
                    }
                    continue;
                }
                if current.is_none() {
                    if name == "item" || name == "entry" {
                        current = Some(RawEntry::default());
                    }
                } else if field.is_none() {
                    if let Some(entry) = current.as_mut() {
                        match name.as_str() {
                            "link" => take_href(entry, &e),
                            "source" => take_source_url(entry, &e),
                            _ => {}
                        }
                    }
                    field = Some(name);
                    buf.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                if field.is_none() && local_name(&e) == "link" {
                    if let Some(entry) = current.as_mut() {
                        take_href(entry, &e);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    let text = e.unescape().unwrap_or_default();
                    push_text(&mut buf, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    push_text(&mut buf, &text);
                }
            }
            Ok(Event::End(e)) => {
                let name = std::str::from_utf8(e.local_name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if field.as_deref() == Some(name.as_str()) {
                    if let Some(entry) = current.as_mut() {
                        assign(entry, &name, std::mem::take(&mut buf));
                    }
                    field = None;
                } else if field.is_none() && (name == "item" || name == "entry") {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Xml(e)),
            _ => {}
        }
    }

    if !saw_root {
        return Err(FeedError::NotAFeed);
    }
    Ok(entries)
}

/// Body text per the rules in the module docs.
fn decode_body(body: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(body) {
        return Cow::Borrowed(text);
    }
    let declared = DECLARED_ENCODING
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).to_ascii_lowercase());
    match declared.as_deref() {
        Some("iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "windows-1252") => {
            Cow::Owned(body.iter().map(|&b| char::from(b)).collect())
        }
        _ => String::from_utf8_lossy(body),
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    std::str::from_utf8(e.local_name().as_ref())
        .unwrap_or("")
        .to_string()
}

fn push_text(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}

/// Atom-style `<link href="..."/>`. The first alternate (or rel-less) link wins.
fn take_href(entry: &mut RawEntry, e: &BytesStart<'_>) {
    if !entry.link.is_empty() {
        return;
    }
    let mut href = None;
    let mut alternate = true;
    for attr in e.attributes().flatten() {
        match attr.key.local_name().as_ref() {
            b"href" => href = attr.unescape_value().ok().map(|v| v.into_owned()),
            b"rel" => alternate = attr.value.as_ref() == b"alternate",
            _ => {}
        }
    }
    if let (Some(href), true) = (href, alternate) {
        entry.link = href.trim().to_string();
    }
}

/// RSS `<source url="...">`: the outlet the aggregator took the item from.
fn take_source_url(entry: &mut RawEntry, e: &BytesStart<'_>) {
    let url = e
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"url")
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if url.is_some() {
        entry.source_url = url;
    }
}

fn assign(entry: &mut RawEntry, name: &str, value: String) {
    let value = value.trim().to_string();
    if value.is_empty() {
        return;
    }
    match name {
        "title" => entry.title = value,
        "link" => {
            if entry.link.is_empty() {
                entry.link = value;
            }
        }
        "description" | "summary" => entry.summary = value,
        "encoded" | "content" => {
            if entry.summary.is_empty() {
                entry.summary = value;
            }
        }
        "pubDate" => {
            entry.published = DateTime::parse_from_rfc2822(&value).ok();
            entry.published_raw = Some(value);
        }
        "published" | "issued" | "date" => {
            entry.published = parse_rfc3339(&value);
            entry.published_raw = Some(value);
        }
        "updated" | "modified" => {
            entry.updated = parse_rfc3339(&value);
            entry.updated_raw = Some(value);
        }
        _ => {}
    }
}

fn parse_rfc3339(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}
