//! Full-page article extraction.
//!
//! Downloads the page and reads the paragraphs of its main content container,
//! keeping one paragraph per `<p>` so the synthesizer can split on structure.
//!
//! # Container Choice
//!
//! Every element matching [`CONTAINERS`] is scored by the total length of
//! its paragraph text; the best one wins. Pages with no recognizable
//! container fall back to every `<p>` in the document.

use super::{fetch_html, Extracted, Extractor};
use crate::error::ExtractionError;
use crate::models::ExtractionTier;
use crate::utils::collapse_whitespace;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

const CONTAINERS: &str = "article, [itemprop=articleBody], main, [role=main], .article-body, \
     .article-content, .entry-content, .post-content, .story-body, .nota-body, #article-body";

static CONTAINER: Lazy<Selector> = Lazy::new(|| Selector::parse(CONTAINERS).unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

#[derive(Debug, Clone)]
pub struct FullPageExtractor {
    client: Client,
}

impl FullPageExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Extractor for FullPageExtractor {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::FullPage
    }

    #[instrument(level = "debug", skip(self))]
    async fn extract(&self, url: &str) -> Result<Extracted, ExtractionError> {
        let html = fetch_html(&self.client, url).await?;
        parse_article(&html)
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn paragraphs_in(el: ElementRef<'_>) -> Vec<String> {
    el.select(&PARAGRAPH)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect()
}

fn page_title(document: &Html) -> String {
    document
        .select(&OG_TITLE)
        .find_map(|m| m.value().attr("content").map(collapse_whitespace))
        .filter(|t| !t.is_empty())
        .or_else(|| document.select(&H1).map(element_text).find(|t| !t.is_empty()))
        .or_else(|| document.select(&TITLE).map(element_text).find(|t| !t.is_empty()))
        .unwrap_or_default()
}

/// Extract title and paragraph-separated body text from an article page.
pub fn parse_article(html: &str) -> Result<Extracted, ExtractionError> {
    let document = Html::parse_document(html);
    let title = page_title(&document);

    let best = document
        .select(&CONTAINER)
        .map(paragraphs_in)
        .max_by_key(|ps| ps.iter().map(|p| p.chars().count()).sum::<usize>())
        .filter(|ps| !ps.is_empty());

    let paragraphs = match best {
        Some(ps) => ps,
        None => paragraphs_in(document.root_element()),
    };

    if paragraphs.is_empty() {
        return Err(ExtractionError::Empty);
    }
    debug!(paragraphs = paragraphs.len(), %title, "Parsed article page");
    Ok(Extracted {
        title,
        text: paragraphs.join("\n\n"),
    })
}
