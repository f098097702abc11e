//! Typed errors for each pipeline stage.
//!
//! Only [`ConfigError`] is allowed to end a run. Fetch and extraction errors
//! are absorbed where they happen and only show up in the logs.

use thiserror::Error;

/// Problems with the run configuration, detected before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no topics configured")]
    NoTopics,

    #[error("topic {0:?} has no search terms")]
    EmptyTerms(String),

    #[error("topic {0:?} contains a blank search term")]
    BlankTerm(String),

    #[error("max_per_topic must be at least 1")]
    ZeroCap,

    #[error("retries must be at least 1")]
    ZeroRetries,

    #[error("min_paragraphs ({min}) is greater than max_paragraphs ({max})")]
    ParagraphBounds { min: usize, max: usize },

    #[error("unknown timezone {0:?}")]
    Timezone(String),

    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Parsing a syndication feed body failed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("body is not an RSS or Atom document")]
    NotAFeed,
}

/// A single feed fetch attempt failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("feed has no entries")]
    Empty,
}

/// One extraction tier could not produce text for a URL.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("could not parse page: {0}")]
    Parse(String),

    #[error("no readable text found")]
    Empty,
}
