//! Markdown rendering of a [`Digest`].
//!
//! Topics appear in configuration order; topics with no items are omitted.
//! A digest with no items renders a single placeholder line so the edition
//! file still exists and says so.

use super::edition_file;
use crate::models::{Digest, EnrichedItem, Scope};
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Placeholder body for a run that found nothing.
pub const NO_NEWS: &str = "_No news found today for the selected topics._";

fn scope_note(scope: Option<Scope>) -> &'static str {
    match scope {
        Some(Scope::PreferredOnly) => "Sources: preferred outlets only.",
        Some(Scope::AnySource) => "Sources: any outlet (no preferred-outlet headlines today).",
        None => "Sources: none.",
    }
}

fn write_item(md: &mut String, entry: &EnrichedItem) {
    let item = &entry.item;
    writeln!(md, "### {}", item.title.trim()).unwrap();
    writeln!(md).unwrap();
    if item.domain.is_empty() {
        writeln!(md, "[Read the original]({})", item.link).unwrap();
    } else {
        writeln!(md, "*{}* · [Read the original]({})", item.domain, item.link).unwrap();
    }
    writeln!(md).unwrap();
    for paragraph in &entry.paragraphs {
        writeln!(md, "{paragraph}").unwrap();
        writeln!(md).unwrap();
    }
}

/// Render the digest as a Markdown document.
pub fn digest_to_markdown(digest: &Digest) -> String {
    let mut md = String::new();

    writeln!(
        md,
        "# Headline digest: {} ({})",
        digest.local_date.format("%Y-%m-%d"),
        digest.edition
    )
    .unwrap();
    writeln!(md).unwrap();
    writeln!(
        md,
        "_Generated {}. {}_",
        digest.generated_at.format("%Y-%m-%d %H:%M %:z"),
        scope_note(digest.scope)
    )
    .unwrap();
    writeln!(md).unwrap();

    if !digest.should_notify() {
        writeln!(md, "{NO_NEWS}").unwrap();
        return md;
    }

    for topic in &digest.topics {
        let mut items = digest.items_for(topic).peekable();
        if items.peek().is_none() {
            continue;
        }
        writeln!(md, "## {topic}").unwrap();
        writeln!(md).unwrap();
        for entry in items {
            write_item(&mut md, entry);
        }
    }

    md
}

/// Write the rendered digest into `daily_dir` as `digest_{edition}.md`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
#[instrument(level = "info", skip_all, fields(daily_dir = %daily_dir.display()))]
pub async fn write_markdown(digest: &Digest, daily_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let path = daily_dir.join(edition_file(&digest.edition, "md"));
    fs::write(&path, digest_to_markdown(digest)).await?;
    info!(path = %path.display(), items = digest.items_count(), "Wrote Markdown digest");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateItem, ExtractionTier};
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    fn enriched(topic: &str, title: &str, paragraphs: &[&str]) -> EnrichedItem {
        let item = CandidateItem {
            topic: topic.into(),
            title: title.into(),
            link: format!("https://eleconomista.com.mx/{}", title.len()),
            domain: "eleconomista.com.mx".into(),
            feed_summary: String::new(),
            captured_at: FixedOffset::west_opt(6 * 3600)
                .unwrap()
                .with_ymd_and_hms(2025, 10, 9, 8, 0, 0)
                .unwrap(),
        };
        EnrichedItem::new(
            item,
            paragraphs.iter().map(|p| p.to_string()).collect(),
            ExtractionTier::FullPage,
        )
        .unwrap()
    }

    fn digest(items: Vec<EnrichedItem>, scope: Option<Scope>) -> Digest {
        Digest {
            local_date: NaiveDate::from_ymd_opt(2025, 10, 9).unwrap(),
            edition: "morning".into(),
            generated_at: FixedOffset::west_opt(6 * 3600)
                .unwrap()
                .with_ymd_and_hms(2025, 10, 9, 8, 30, 0)
                .unwrap(),
            scope,
            topics: vec!["Banca de desarrollo".into(), "Inversión".into(), "Vivienda".into()],
            items,
        }
    }

    #[test]
    fn test_empty_digest_renders_placeholder() {
        let md = digest_to_markdown(&digest(vec![], None));
        assert!(md.starts_with("# Headline digest: 2025-10-09 (morning)"));
        assert!(md.contains(NO_NEWS));
        assert!(!md.contains("## "));
    }

    #[test]
    fn test_topics_follow_config_order_and_skip_empty() {
        let items = vec![
            enriched("Inversión", "IED récord", &["Uno."]),
            enriched("Banca de desarrollo", "Nafin crédito", &["Primero.", "Segundo."]),
        ];
        let md = digest_to_markdown(&digest(items, Some(Scope::PreferredOnly)));

        let banca = md.find("## Banca de desarrollo").unwrap();
        let inversion = md.find("## Inversión").unwrap();
        assert!(banca < inversion);
        assert!(!md.contains("## Vivienda"));
        assert!(md.contains("preferred outlets only"));
        assert!(md.contains("### Nafin crédito\n\n*eleconomista.com.mx*"));
        assert!(md.contains("Primero.\n\nSegundo.\n\n"));
    }

    #[test]
    fn test_item_without_domain_shows_link_only() {
        let mut entry = enriched("Inversión", "IED récord", &["Uno."]);
        entry.item.domain.clear();
        let expected = format!("### IED récord\n\n[Read the original]({})\n", entry.item.link);
        let md = digest_to_markdown(&digest(vec![entry], Some(Scope::AnySource)));
        assert!(md.contains(&expected));
    }

    #[tokio::test]
    async fn test_write_markdown_uses_edition_name() {
        let dir = std::env::temp_dir().join(format!("headline_digest_md_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_markdown(&digest(vec![], None), &dir).await.unwrap();
        assert!(path.ends_with("digest_morning.md"));
        assert!(std::fs::read_to_string(&path).unwrap().contains(NO_NEWS));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
