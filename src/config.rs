//! Run configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock Mexican-economy topic set. [`Config::validate`] runs before any
//! network activity; a bad config ends the run immediately.

use crate::error::ConfigError;
use crate::models::Topic;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Topics in output order.
    pub topics: Vec<Topic>,
    /// Sources searched first; only these count during the restricted pass.
    pub preferred_domains: BTreeSet<String>,
    /// Hosts that wrap article links in redirect pages.
    pub aggregator_hosts: Vec<String>,
    /// IANA zone that defines "today".
    pub timezone: String,
    /// Cap on captured headlines per topic.
    pub max_per_topic: usize,
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub extraction: ExtractionConfig,
    pub synthesis: SynthesisConfig,
}

/// Search endpoint and locale parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub hl: String,
    pub gl: String,
    pub ceid: String,
    /// Recency window passed as `when:<N>d`.
    pub window_days: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Timeout for the HEAD request used to unwrap aggregator links.
    pub head_timeout_secs: u64,
    pub retries: usize,
    /// Delay before retry `n` is `base_delay_ms * n`.
    pub base_delay_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn head_timeout(&self) -> Duration {
        Duration::from_secs(self.head_timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Switches for the body extraction tiers, tried in this order.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub full_page: bool,
    pub readability: bool,
    pub feed_summary: bool,
}

/// Bounds and thresholds for turning raw text into paragraphs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub min_paragraphs: usize,
    pub max_paragraphs: usize,
    /// Structural paragraphs shorter than this are captions or bylines.
    pub min_paragraph_chars: usize,
    /// A sentence block closes once it grows past this length.
    pub block_chars: usize,
    pub min_sentence_chars: usize,
    pub summary_block_chars: usize,
    pub summary_min_sentence_chars: usize,
    pub summary_max_blocks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topics: default_topics(),
            preferred_domains: [
                "elfinanciero.com.mx",
                "eleconomista.com.mx",
                "jornada.com.mx",
                "eluniversal.com.mx",
                "dineroenimagen.com",
                "bbc.com",
                "reuters.com",
                "france24.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            aggregator_hosts: vec!["news.google.com".to_string()],
            timezone: "America/Mexico_City".to_string(),
            max_per_topic: 2,
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            extraction: ExtractionConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://news.google.com/rss/search".to_string(),
            hl: "es-419".to_string(),
            gl: "MX".to_string(),
            ceid: "MX:es-419".to_string(),
            window_days: 1,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "Mozilla/5.0 (compatible; headline_digest/",
                env!("CARGO_PKG_VERSION"),
                ")"
            )
            .to_string(),
            timeout_secs: 25,
            head_timeout_secs: 10,
            retries: 3,
            base_delay_ms: 1200,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            full_page: true,
            readability: true,
            feed_summary: true,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            min_paragraphs: 3,
            max_paragraphs: 4,
            min_paragraph_chars: 80,
            block_chars: 350,
            min_sentence_chars: 40,
            summary_block_chars: 200,
            summary_min_sentence_chars: 30,
            summary_max_blocks: 4,
        }
    }
}

fn default_topics() -> Vec<Topic> {
    vec![
        Topic::new(
            "Plan México",
            [
                "\u{201c}Plan México\u{201d}",
                "Plan Mexico",
                "Polos de Bienestar",
                "relocalización industrial México",
                "corredor interoceánico",
                "nearshoring México",
            ],
        ),
        Topic::new(
            "Banca de Desarrollo / Bancomext / Nafin",
            [
                "banca de desarrollo México",
                "Nafin",
                "Bancomext",
                "FIRA",
                "Financiera Nacional de Desarrollo",
                "Nacional Financiera",
            ],
        ),
        Topic::new(
            "Sectores Productivos y Económicos",
            [
                "sectores productivos México",
                "industria manufacturera México",
                "inversión productiva México",
                "exportaciones México",
                "nearshoring México",
            ],
        ),
        Topic::new(
            "Mercados Financieros",
            [
                "Bolsa Mexicana de Valores",
                "BMV",
                "peso mexicano",
                "tipo de cambio dólar",
                "tasa de interés Banxico",
                "bonos M",
                "mercados financieros México",
            ],
        ),
        Topic::new(
            "Inversión",
            [
                "inversión productiva México",
                "inversión pública México",
                "IED México",
                "inversión extranjera directa México",
            ],
        ),
        Topic::new(
            "Aranceles y Comercio",
            [
                "aranceles México",
                "impuesto a importaciones México",
                "medidas comerciales México",
                "comercio exterior México",
            ],
        ),
        Topic::new(
            "Indicadores Económicos Relevantes",
            [
                "PIB México",
                "inflación México",
                "IGAE",
                "Indicador Oportuno de la Actividad Económica",
                "PMI México",
                "IMSS empleo",
                "tasa de desempleo México",
                "INEGI",
            ],
        ),
    ]
}

impl Config {
    /// Load from a YAML file, or fall back to defaults when no path is given.
    /// The result is validated either way.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_string(),
                    source,
                })?;
                Self::from_yaml(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        info!(
            topics = config.topics.len(),
            preferred = config.preferred_domains.len(),
            max_per_topic = config.max_per_topic,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topics.is_empty() {
            return Err(ConfigError::NoTopics);
        }
        for topic in &self.topics {
            if topic.terms.is_empty() {
                return Err(ConfigError::EmptyTerms(topic.name.clone()));
            }
            if topic.terms.iter().any(|t| t.trim().is_empty()) {
                return Err(ConfigError::BlankTerm(topic.name.clone()));
            }
        }
        if self.max_per_topic == 0 {
            return Err(ConfigError::ZeroCap);
        }
        if self.fetch.retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        let s = &self.synthesis;
        if s.min_paragraphs > s.max_paragraphs {
            return Err(ConfigError::ParagraphBounds {
                min: s.min_paragraphs,
                max: s.max_paragraphs,
            });
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Timezone(self.timezone.clone()))
    }
}
