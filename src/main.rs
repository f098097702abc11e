//! # Headline Digest
//!
//! Collects same-day news headlines for a fixed set of topics from a news
//! search feed, prefers a list of trusted outlets, synthesizes a short body
//! for each headline, and writes a Markdown and JSON digest per edition.
//!
//! ## Usage
//!
//! ```sh
//! headline_digest -c config.yaml -o ./digests
//! ```
//!
//! ## Architecture
//!
//! One run is a strictly sequential pipeline:
//! 1. **Collection**: one search-feed query per topic, restricted to preferred
//!    outlets; if that yields nothing at all, one more pass over any outlet
//! 2. **Filtering**: same local day only, aggregator links resolved, duplicates
//!    removed, per-topic cap applied
//! 3. **Enrichment**: body text via full page, then readability, then the feed
//!    summary, regrouped into a few readable paragraphs
//! 4. **Output**: Markdown and JSON under a daily folder, the CSV log, and a
//!    `.ok` completion marker

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod collect;
mod config;
mod dedup;
mod error;
mod extract;
mod feed;
mod fetch;
mod links;
mod models;
mod outputs;
mod query;
mod synth;
mod temporal;
mod utils;

use crate::error::ConfigError;
use cli::Cli;
use collect::Collector;
use config::Config;
use extract::ExtractionChain;
use fetch::{build_client, HttpFeedFetcher, RetryFetch};
use links::LinkResolver;
use models::Digest;
use outputs::markdown;
use synth::Synthesizer;
use temporal::TemporalFilter;
use utils::{edition_for, ensure_writable_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("headline_digest starting up");

    let args = Cli::parse();
    debug!(?args.config, %args.output_dir, dry_run = args.dry_run, "Parsed CLI arguments");

    // Config problems abort before any network traffic.
    let config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    let tz = config.tz()?;

    if !args.dry_run {
        if let Err(e) = ensure_writable_dir(&args.output_dir).await {
            error!(
                path = %args.output_dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let client = build_client(&config.fetch).map_err(ConfigError::Client)?;
    let source = RetryFetch::new(
        HttpFeedFetcher::new(client.clone()),
        config.fetch.retries,
        config.fetch.base_delay(),
    );
    let resolver = LinkResolver::new(
        client.clone(),
        config.aggregator_hosts.clone(),
        config.fetch.head_timeout(),
    );

    let now = Utc::now().with_timezone(&tz);
    let filter = TemporalFilter::for_now(tz);
    let local_date = filter.today();

    // ---- Collection ----
    let outcome = Collector::new(&source, &resolver, filter, &config, now.fixed_offset())
        .collect()
        .await;
    info!(
        scope = ?outcome.scope,
        candidates = outcome.items.len(),
        "Collection finished"
    );

    // ---- Enrichment ----
    let chain = ExtractionChain::standard(
        client,
        &config.extraction,
        Synthesizer::new(config.synthesis.clone()),
    );
    let items = chain.enrich_all(outcome.items).await;
    for entry in &items {
        debug!(
            topic = %entry.item.topic,
            domain = %entry.item.domain,
            tier = entry.tier.as_str(),
            title = %truncate_for_log(&entry.item.title, 80),
            "Digest item"
        );
    }

    let edition = args
        .edition_label
        .clone()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| edition_for(now.time()).to_string());

    let digest = Digest {
        local_date,
        edition,
        generated_at: Utc::now().with_timezone(&tz).fixed_offset(),
        scope: outcome.scope,
        topics: config.topics.iter().map(|t| t.name.clone()).collect(),
        items,
    };

    // ---- Output ----
    if args.dry_run {
        info!(items = digest.items_count(), "Dry run; skipping all writes");
        print!("{}", markdown::digest_to_markdown(&digest));
    } else {
        let daily_dir = outputs::write_all(&digest, Path::new(&args.output_dir)).await?;
        debug!(daily_dir = %daily_dir.display(), "Outputs written");
    }

    if digest.should_notify() {
        info!(items = digest.items_count(), edition = %digest.edition, "Digest ready for notification");
    } else {
        info!(edition = %digest.edition, "No items; notification suppressed");
    }

    let elapsed = start_time.elapsed();
    info!(
        elapsed_secs = elapsed.as_secs_f64(),
        items = digest.items_count(),
        "headline_digest run complete"
    );

    Ok(())
}
