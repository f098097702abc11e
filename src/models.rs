//! Data models for the collection pipeline.
//!
//! Entities move through the pipeline in one direction:
//!
//! - [`RawEntry`]: a record as parsed from the search feed
//! - [`CandidateItem`]: a same-day, source-resolved, deduplicated headline
//! - [`EnrichedItem`]: a candidate plus its synthesized body paragraphs
//!
//! Nothing is mutated after creation; each stage wraps the previous value.
//! [`Digest`] is the per-run collection handed to the outputs.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// A named bucket of search terms. Loaded once from config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    /// Display name, also the grouping key in every output.
    pub name: String,
    /// Search terms, OR-joined into one query.
    pub terms: Vec<String>,
}

impl Topic {
    pub fn new<N, I, T>(name: N, terms: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }
}

/// A feed entry before any filtering.
///
/// Structured timestamps are filled by the feed parser when the date field
/// parses cleanly; the raw strings are kept regardless so the temporal filter
/// can retry with a more lenient parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    /// Summary/description as found in the feed (may contain markup).
    pub summary: String,
    pub published: Option<DateTime<FixedOffset>>,
    pub updated: Option<DateTime<FixedOffset>>,
    pub published_raw: Option<String>,
    pub updated_raw: Option<String>,
    /// Publisher home page from RSS `<source url="...">`, when the feed names one.
    pub source_url: Option<String>,
}

/// Which source restriction a collection pass ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    PreferredOnly,
    AnySource,
}

impl Scope {
    pub fn is_restricted(self) -> bool {
        matches!(self, Scope::PreferredOnly)
    }
}

/// A headline that survived the date filter, link resolution and dedup.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CandidateItem {
    pub topic: String,
    pub title: String,
    /// Publisher URL after undoing aggregator redirects.
    pub link: String,
    /// Host of `link`, lower-cased, without `www.`.
    pub domain: String,
    /// Plain-text feed summary, the last-resort body source.
    pub feed_summary: String,
    pub captured_at: DateTime<FixedOffset>,
}

/// Where an item's body text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    FullPage,
    Readability,
    FeedSummary,
}

impl ExtractionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionTier::FullPage => "full_page",
            ExtractionTier::Readability => "readability",
            ExtractionTier::FeedSummary => "feed_summary",
        }
    }
}

/// A candidate with a synthesized body. `paragraphs` is never empty.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EnrichedItem {
    #[serde(flatten)]
    pub item: CandidateItem,
    pub paragraphs: Vec<String>,
    pub tier: ExtractionTier,
}

impl EnrichedItem {
    /// Wrap a candidate, refusing an empty or all-blank paragraph list.
    pub fn new(item: CandidateItem, paragraphs: Vec<String>, tier: ExtractionTier) -> Option<Self> {
        let paragraphs: Vec<String> = paragraphs
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if paragraphs.is_empty() {
            return None;
        }
        Some(Self {
            item,
            paragraphs,
            tier,
        })
    }
}

/// Everything one run produced, in topic configuration order.
#[derive(Debug, Serialize, Deserialize)]
pub struct Digest {
    pub local_date: NaiveDate,
    /// Edition label, e.g. `"morning"`.
    pub edition: String,
    pub generated_at: DateTime<FixedOffset>,
    /// Scope of the pass that produced the items; `None` when nothing was found.
    pub scope: Option<Scope>,
    /// Topic names in configuration order, so renderers can group stably.
    pub topics: Vec<String>,
    pub items: Vec<EnrichedItem>,
}

impl Digest {
    pub fn items_count(&self) -> usize {
        self.items.len()
    }

    /// Notifications are only worth sending when something was found.
    pub fn should_notify(&self) -> bool {
        self.items_count() > 0
    }

    /// Items of one topic, in capture order.
    pub fn items_for<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a EnrichedItem> + 'a {
        self.items.iter().filter(move |e| e.item.topic == topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(topic: &str, title: &str) -> CandidateItem {
        CandidateItem {
            topic: topic.to_string(),
            title: title.to_string(),
            link: "https://eleconomista.com.mx/nota".to_string(),
            domain: "eleconomista.com.mx".to_string(),
            feed_summary: String::new(),
            captured_at: FixedOffset::west_opt(6 * 3600)
                .unwrap()
                .with_ymd_and_hms(2025, 10, 9, 8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_enriched_item_rejects_empty_paragraphs() {
        let c = candidate("Inversión", "Nota");
        assert!(EnrichedItem::new(c.clone(), vec![], ExtractionTier::FullPage).is_none());
        assert!(
            EnrichedItem::new(c, vec!["  ".into(), "\n".into()], ExtractionTier::FeedSummary)
                .is_none()
        );
    }

    #[test]
    fn test_enriched_item_drops_blank_paragraphs() {
        let c = candidate("Inversión", "Nota");
        let e = EnrichedItem::new(
            c,
            vec!["".into(), "Cuerpo".into()],
            ExtractionTier::Readability,
        )
        .unwrap();
        assert_eq!(e.paragraphs, vec!["Cuerpo".to_string()]);
    }

    #[test]
    fn test_digest_grouping_and_gate() {
        let a = EnrichedItem::new(candidate("A", "uno"), vec!["p".into()], ExtractionTier::FullPage)
            .unwrap();
        let b = EnrichedItem::new(candidate("B", "dos"), vec!["p".into()], ExtractionTier::FullPage)
            .unwrap();
        let digest = Digest {
            local_date: NaiveDate::from_ymd_opt(2025, 10, 9).unwrap(),
            edition: "morning".into(),
            generated_at: a.item.captured_at,
            scope: Some(Scope::PreferredOnly),
            topics: vec!["A".into(), "B".into()],
            items: vec![a, b],
        };
        assert_eq!(digest.items_count(), 2);
        assert!(digest.should_notify());
        assert_eq!(digest.items_for("B").count(), 1);
        assert_eq!(digest.items_for("C").count(), 0);
    }

    #[test]
    fn test_enriched_item_serializes_flat() {
        let e = EnrichedItem::new(candidate("A", "uno"), vec!["p".into()], ExtractionTier::FeedSummary)
            .unwrap();
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["topic"], "A");
        assert_eq!(json["domain"], "eleconomista.com.mx");
        assert_eq!(json["tier"], "feed_summary");
    }
}
