//! Per-topic headline collection with scope fallback.
//!
//! A run first collects every topic restricted to the preferred sources. Only
//! when that pass captures nothing at all does it run a second, unrestricted
//! pass. There is no third tier: an empty second pass means no news today.
//!
//! Per topic the stages are: query URL → feed entries → same-day filter →
//! link resolution → (restricted pass only) preferred-domain check → dedup/cap.
//! Topics run in configuration order and entries in feed order.

use crate::config::Config;
use crate::dedup::{Admission, Deduplicator};
use crate::fetch::FeedSource;
use crate::links::LinkResolver;
use crate::models::{CandidateItem, Scope, Topic};
use crate::query::topic_url;
use crate::temporal::TemporalFilter;
use crate::utils::{collapse_whitespace, plain_text};
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Result of a full collection run.
#[derive(Debug)]
pub struct CollectionOutcome {
    /// Scope of the pass that produced `items`; `None` when both passes were empty.
    pub scope: Option<Scope>,
    pub items: Vec<CandidateItem>,
}

/// True when `domain` is a preferred domain or a subdomain of one.
///
/// An empty `preferred` set matches nothing.
pub fn is_preferred(domain: &str, preferred: &BTreeSet<String>) -> bool {
    preferred.contains(domain)
        || preferred
            .iter()
            .any(|d| domain.ends_with(&format!(".{d}")))
}

/// State for one topic within one pass. Created per topic, dropped after.
#[derive(Debug)]
struct TopicContext<'t> {
    topic: &'t Topic,
    scope: Scope,
    dedup: Deduplicator,
    entries: usize,
    stale: usize,
    off_scope: usize,
    duplicates: usize,
}

impl<'t> TopicContext<'t> {
    fn new(topic: &'t Topic, scope: Scope, cap: usize) -> Self {
        Self {
            topic,
            scope,
            dedup: Deduplicator::new(cap),
            entries: 0,
            stale: 0,
            off_scope: 0,
            duplicates: 0,
        }
    }

    fn finish(self) -> Vec<CandidateItem> {
        info!(
            topic = %self.topic.name,
            scope = ?self.scope,
            entries = self.entries,
            not_today = self.stale,
            off_scope = self.off_scope,
            duplicates = self.duplicates,
            kept = self.dedup.len(),
            "Collected topic"
        );
        self.dedup.into_items()
    }
}

/// Drives collection across all topics.
pub struct Collector<'a, S> {
    source: &'a S,
    resolver: &'a LinkResolver,
    filter: TemporalFilter,
    config: &'a Config,
    captured_at: DateTime<FixedOffset>,
}

impl<'a, S> Collector<'a, S>
where
    S: FeedSource,
{
    /// # Arguments
    ///
    /// * `source` - Feed entries per query URL, failures already absorbed
    /// * `resolver` - Unwraps aggregator links
    /// * `filter` - Same-day filter for the run's local date
    /// * `config` - Topics, preferred domains, cap and search settings
    /// * `captured_at` - Timestamp stamped on every candidate
    pub fn new(
        source: &'a S,
        resolver: &'a LinkResolver,
        filter: TemporalFilter,
        config: &'a Config,
        captured_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            source,
            resolver,
            filter,
            config,
            captured_at,
        }
    }

    /// Restricted pass, then at most one unrestricted pass.
    ///
    /// # Returns
    ///
    /// The items of the first non-empty pass with that pass's scope, or no
    /// items and `scope: None` when both passes came back empty.
    #[instrument(level = "info", skip_all, fields(today = %self.filter.today()))]
    pub async fn collect(&self) -> CollectionOutcome {
        let items = self.collect_pass(Scope::PreferredOnly).await;
        if !items.is_empty() {
            return CollectionOutcome {
                scope: Some(Scope::PreferredOnly),
                items,
            };
        }

        info!("No results from preferred sources; searching any source");
        let items = self.collect_pass(Scope::AnySource).await;
        if items.is_empty() {
            info!("No news found for today in any source");
            return CollectionOutcome { scope: None, items };
        }
        CollectionOutcome {
            scope: Some(Scope::AnySource),
            items,
        }
    }

    /// One pass over every topic under `scope`.
    ///
    /// # Arguments
    ///
    /// * `scope` - Whether queries and results are limited to preferred domains
    ///
    /// # Returns
    ///
    /// Candidates for all topics, in topic order, each topic capped.
    #[instrument(level = "info", skip(self))]
    pub async fn collect_pass(&self, scope: Scope) -> Vec<CandidateItem> {
        let mut all = Vec::new();
        for topic in &self.config.topics {
            all.extend(self.collect_topic(topic, scope).await);
        }
        info!(count = all.len(), ?scope, "Collection pass complete");
        all
    }

    async fn collect_topic(&self, topic: &Topic, scope: Scope) -> Vec<CandidateItem> {
        let url = topic_url(
            topic,
            scope,
            &self.config.preferred_domains,
            &self.config.search,
        );
        debug!(topic = %topic.name, %url, "Fetching topic feed");
        let entries = self.source.entries(&url).await;

        let mut ctx = TopicContext::new(topic, scope, self.config.max_per_topic);
        ctx.entries = entries.len();

        for entry in entries {
            if ctx.dedup.is_full() {
                break;
            }
            if !self.filter.accepts(&entry) {
                ctx.stale += 1;
                continue;
            }
            let title = collapse_whitespace(&entry.title);
            if title.is_empty() || entry.link.trim().is_empty() {
                debug!(link = %entry.link, "Skipping entry without title or link");
                continue;
            }

            let resolved = self
                .resolver
                .resolve(entry.link.trim(), entry.source_url.as_deref())
                .await;
            if scope.is_restricted() && !is_preferred(&resolved.domain, &self.config.preferred_domains) {
                debug!(domain = %resolved.domain, "Skipping non-preferred source");
                ctx.off_scope += 1;
                continue;
            }

            let candidate = CandidateItem {
                topic: topic.name.clone(),
                title,
                link: resolved.url,
                domain: resolved.domain,
                feed_summary: plain_text(&entry.summary),
                captured_at: self.captured_at,
            };
            match ctx.dedup.offer(candidate) {
                Admission::Accepted => {}
                Admission::Duplicate => ctx.duplicates += 1,
                Admission::CapReached => break,
            }
        }

        ctx.finish()
    }
}
