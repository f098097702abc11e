//! Command-line interface definitions for the headline digest.
//!
//! All options can also come from environment variables, which is how the
//! scheduled morning and evening runs pass the edition label.

use clap::Parser;

/// Command-line arguments for one collection run.
///
/// # Examples
///
/// ```sh
/// # Built-in topics and sources, outputs under ./digests
/// headline_digest
///
/// # Custom config, explicit edition, no files written
/// headline_digest -c config.yaml --edition-label evening --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, env = "HEADLINE_DIGEST_CONFIG")]
    pub config: Option<String>,

    /// Root directory for daily folders and the CSV log
    #[arg(short, long, env = "HEADLINE_DIGEST_OUTPUT_DIR", default_value = "./digests")]
    pub output_dir: String,

    /// Edition label; derived from the local time of day when absent
    #[arg(long, env = "EDITION_LABEL")]
    pub edition_label: Option<String>,

    /// Collect and synthesize, but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["headline_digest"]);
        assert_eq!(cli.output_dir, "./digests");
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "headline_digest",
            "-c",
            "/etc/digest.yaml",
            "-o",
            "/tmp/out",
            "--edition-label",
            "evening",
            "--dry-run",
        ]);

        assert_eq!(cli.config.as_deref(), Some("/etc/digest.yaml"));
        assert_eq!(cli.output_dir, "/tmp/out");
        assert_eq!(cli.edition_label.as_deref(), Some("evening"));
        assert!(cli.dry_run);
    }
}
