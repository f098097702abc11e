//! Article body extraction with a layered fallback chain.
//!
//! Each item's body is looked up tier by tier until one yields at least one
//! usable paragraph:
//!
//! | Tier | Module | Method |
//! |------|--------|--------|
//! | 1 | [`full_page`] | download, parse markup, read the main content container |
//! | 2 | [`readability`] | download, readability heuristic, strip markup |
//! | 3 | (none) | the feed summary carried on the candidate, never re-fetched |
//!
//! A tier that errors, or whose text synthesizes to zero paragraphs, is logged
//! and skipped. Items for which every tier fails are dropped.

pub mod full_page;
pub mod readability;

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::models::{CandidateItem, EnrichedItem, ExtractionTier};
use crate::synth::Synthesizer;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, info, instrument};

/// Title and plain body text of an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub text: String,
}

/// One extraction capability.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn tier(&self) -> ExtractionTier;

    async fn extract(&self, url: &str) -> Result<Extracted, ExtractionError>;
}

/// GET a page and return its body as text, failing on non-success status.
pub(crate) async fn fetch_html(client: &Client, url: &str) -> Result<String, ExtractionError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

/// Ordered extractors plus the feed-summary fallback.
pub struct ExtractionChain {
    extractors: Vec<Box<dyn Extractor>>,
    use_feed_summary: bool,
    synthesizer: Synthesizer,
}

impl ExtractionChain {
    pub fn new(
        extractors: Vec<Box<dyn Extractor>>,
        use_feed_summary: bool,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            extractors,
            use_feed_summary,
            synthesizer,
        }
    }

    /// The standard chain: full page, then readability, then feed summary,
    /// each included only when enabled.
    pub fn standard(client: Client, switches: &ExtractionConfig, synthesizer: Synthesizer) -> Self {
        let mut extractors: Vec<Box<dyn Extractor>> = Vec::new();
        if switches.full_page {
            extractors.push(Box::new(full_page::FullPageExtractor::new(client.clone())));
        }
        if switches.readability {
            extractors.push(Box::new(readability::ReadabilityExtractor::new(client)));
        }
        let chain = Self::new(extractors, switches.feed_summary, synthesizer);
        info!(tiers = ?chain.tiers(), "Extraction chain ready");
        chain
    }

    /// Enabled tiers in the order they are tried, feed summary included.
    pub fn tiers(&self) -> Vec<ExtractionTier> {
        let mut tiers: Vec<ExtractionTier> = self.extractors.iter().map(|e| e.tier()).collect();
        if self.use_feed_summary {
            tiers.push(ExtractionTier::FeedSummary);
        }
        tiers
    }

    /// Body paragraphs for one candidate, or `None` when every tier failed.
    #[instrument(level = "info", skip_all, fields(url = %item.link))]
    pub async fn enrich(&self, item: CandidateItem) -> Option<EnrichedItem> {
        for extractor in &self.extractors {
            let tier = extractor.tier();
            match extractor.extract(&item.link).await {
                Ok(extracted) => {
                    debug!(tier = tier.as_str(), title = %extracted.title, "Page extracted");
                    let paragraphs = self.synthesizer.body(&extracted.text);
                    if paragraphs.is_empty() {
                        info!(tier = tier.as_str(), chars = extracted.text.len(), "Extracted text gave no usable paragraphs");
                        continue;
                    }
                    debug!(tier = tier.as_str(), paragraphs = paragraphs.len(), "Synthesized body");
                    return EnrichedItem::new(item, paragraphs, tier);
                }
                Err(e) => {
                    info!(tier = tier.as_str(), error = %e, "Extraction tier failed");
                }
            }
        }

        if self.use_feed_summary {
            let paragraphs = self.synthesizer.summary(&item.feed_summary);
            if !paragraphs.is_empty() {
                info!(paragraphs = paragraphs.len(), "Using feed summary as body");
                return EnrichedItem::new(item, paragraphs, ExtractionTier::FeedSummary);
            }
        }

        info!(title = %item.title, "No body could be synthesized; dropping item");
        None
    }

    /// Enrich every candidate in order, one at a time. Failed items are
    /// dropped; the relative order of the rest is kept.
    #[instrument(level = "info", skip_all, fields(count = items.len()))]
    pub async fn enrich_all(&self, items: Vec<CandidateItem>) -> Vec<EnrichedItem> {
        let total = items.len();
        let enriched: Vec<EnrichedItem> = stream::iter(items)
            .then(|item| self.enrich(item))
            .filter_map(|opt| std::future::ready(opt))
            .collect()
            .await;
        info!(total, kept = enriched.len(), dropped = total - enriched.len(), "Enrichment complete");
        enriched
    }
}
