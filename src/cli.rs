//! Command-line interface for segscribe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Segmented media transcription
#[derive(Parser, Debug)]
#[command(
    name = "segscribe",
    version,
    about = "Transcribe long media files through an asynchronous speech backend"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Source media file to transcribe
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the full run report as JSON instead of the bare transcript
    #[arg(long)]
    pub json: bool,

    /// Staging bucket override
    #[arg(long, value_name = "BUCKET")]
    pub bucket: Option<String>,

    /// Language code for recognition (e.g. ko-KR, en-US)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Segment duration (default: 5m). Examples: 300, 5m, 90s
    #[arg(long, short = 's', value_name = "DURATION", value_parser = parse_secs)]
    pub segment: Option<u64>,

    /// Poll interval between job status checks (default: 10s)
    #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
    pub poll_interval: Option<u64>,

    /// Maximum poll attempts per segment job
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Maximum concurrent recognition workers (default: 5)
    #[arg(long, short = 'w', value_name = "N")]
    pub workers: Option<usize>,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
fn parse_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check external dependencies and credentials
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_source() {
        let cli = Cli::try_parse_from(["segscribe", "meeting.mp4"]).unwrap();
        assert_eq!(cli.source.as_deref(), Some("meeting.mp4"));
        assert!(cli.command.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "segscribe",
            "meeting.mp4",
            "--bucket",
            "my-bucket",
            "--language",
            "en-US",
            "-s",
            "2m",
            "--poll-interval",
            "5s",
            "--max-attempts",
            "12",
            "-w",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.bucket.as_deref(), Some("my-bucket"));
        assert_eq!(cli.language.as_deref(), Some("en-US"));
        assert_eq!(cli.segment, Some(120));
        assert_eq!(cli.poll_interval, Some(5));
        assert_eq!(cli.max_attempts, Some(12));
        assert_eq!(cli.workers, Some(3));
    }

    #[test]
    fn test_parse_secs_variants() {
        assert_eq!(parse_secs("300").unwrap(), 300);
        assert_eq!(parse_secs("5m").unwrap(), 300);
        assert_eq!(parse_secs("1h30m").unwrap(), 5400);
        assert!(parse_secs("abc").is_err());
    }

    #[test]
    fn test_parse_check_subcommand() {
        let cli = Cli::try_parse_from(["segscribe", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn test_quiet_is_global() {
        let cli = Cli::try_parse_from(["segscribe", "check", "--quiet"]).unwrap();
        assert!(cli.quiet);
    }
}
