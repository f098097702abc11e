//! Readability-heuristic extraction via `dom_smoothie`.
//!
//! The readable HTML fragment is flattened to a single line through the
//! shared plain-text normalizer, so the synthesizer regroups it by sentences.

use super::{fetch_html, Extracted, Extractor};
use crate::error::ExtractionError;
use crate::models::ExtractionTier;
use crate::utils::plain_text;
use async_trait::async_trait;
use dom_smoothie::{Config, Readability};
use reqwest::Client;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct ReadabilityExtractor {
    client: Client,
}

impl ReadabilityExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Extractor for ReadabilityExtractor {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Readability
    }

    #[instrument(level = "debug", skip(self))]
    async fn extract(&self, url: &str) -> Result<Extracted, ExtractionError> {
        let html = fetch_html(&self.client, url).await?;
        parse_readable(&html, Some(url))
    }
}

/// Run the readability heuristic over a page and normalize its output.
pub fn parse_readable(html: &str, url: Option<&str>) -> Result<Extracted, ExtractionError> {
    let cfg = Config {
        max_elements_to_parse: 9000,
        ..Default::default()
    };
    let mut readability = Readability::new(html, url, Some(cfg))
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;
    let article = readability
        .parse()
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;

    let text = plain_text(&article.content.to_string());
    if text.is_empty() {
        return Err(ExtractionError::Empty);
    }
    debug!(chars = text.len(), "Readability produced text");
    Ok(Extracted {
        title: article.title.to_string(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_page() -> String {
        let paragraph = "El Banco de México mantuvo sin cambios la tasa de interés objetivo, \
            en una decisión unánime de su Junta de Gobierno, que citó la persistencia de la \
            inflación subyacente y la incertidumbre en los mercados financieros internacionales.";
        let body: String = (0..6).map(|_| format!("<p>{paragraph}</p>")).collect();
        format!(
            "<html><head><title>Banxico mantiene tasa</title></head><body>\
             <div class=\"menu\"><a href=\"/\">Inicio</a></div>\
             <article><h1>Banxico mantiene tasa</h1>{body}</article>\
             <footer>Todos los derechos reservados</footer></body></html>"
        )
    }

    #[test]
    fn test_parse_readable_returns_flat_text() {
        let out = parse_readable(&long_page(), Some("https://www.elfinanciero.com.mx/economia/banxico")).unwrap();
        assert!(out.text.contains("El Banco de México mantuvo sin cambios"));
        assert!(!out.text.contains('<'));
        assert!(!out.text.contains('\n'));
    }
}
