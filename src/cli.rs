//! Command-line interface for echoscribe
//!
//! Provides argument parsing using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// Live microphone transcription in fixed-length segments
#[derive(Parser, Debug)]
#[command(
    name = "echoscribe",
    version,
    about = "Live microphone transcription in fixed-length segments"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status messages (quiet mode)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Whisper model name (e.g., base.en) or path to a model file
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language code for recognition (default: auto-detect). Examples: auto, en, de, es
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Segment duration (default: 5s). Examples: 3s, 10s, 1m
    #[arg(long, short = 's', value_name = "DURATION", value_parser = parse_segment_secs)]
    pub segment: Option<u32>,

    /// Decoding precision: fast (greedy) or accurate (beam search)
    #[arg(long, value_name = "PRECISION")]
    pub precision: Option<crate::recognize::recognizer::Precision>,

    /// Sampling temperature passed to the recognition engine (0.0–1.0)
    #[arg(long, value_name = "TEMP")]
    pub temperature: Option<f32>,
}

/// Parse a segment duration string into whole seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`5s`, `1m`), and compound (`1m30s`).
fn parse_segment_secs(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let secs = if let Ok(secs) = s.parse::<u64>() {
        secs
    } else {
        humantime::parse_duration(s)
            .map(|d| d.as_secs())
            .map_err(|e| e.to_string())?
    };

    if secs == 0 {
        return Err("segment duration must be at least 1 second".to_string());
    }
    u32::try_from(secs).map_err(|_| "segment duration too large".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::recognizer::Precision;

    #[test]
    fn test_parse_bare_seconds() {
        assert_eq!(parse_segment_secs("5"), Ok(5));
        assert_eq!(parse_segment_secs("30"), Ok(30));
    }

    #[test]
    fn test_parse_humantime_durations() {
        assert_eq!(parse_segment_secs("5s"), Ok(5));
        assert_eq!(parse_segment_secs("1m"), Ok(60));
        assert_eq!(parse_segment_secs("1m30s"), Ok(90));
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert!(parse_segment_secs("0").is_err());
        assert!(parse_segment_secs("0s").is_err());
        assert!(parse_segment_secs("five").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["echoscribe"]);
        assert!(cli.config.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.model.is_none());
        assert!(cli.segment.is_none());
        assert!(cli.precision.is_none());
        assert!(cli.temperature.is_none());
    }

    #[test]
    fn test_cli_full_invocation() {
        let cli = Cli::parse_from([
            "echoscribe",
            "--model",
            "small.en",
            "--language",
            "en",
            "--segment",
            "10s",
            "--precision",
            "accurate",
            "--temperature",
            "0.4",
            "--quiet",
        ]);

        assert_eq!(cli.model.as_deref(), Some("small.en"));
        assert_eq!(cli.language.as_deref(), Some("en"));
        assert_eq!(cli.segment, Some(10));
        assert_eq!(cli.precision, Some(Precision::Accurate));
        assert_eq!(cli.temperature, Some(0.4));
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_rejects_bad_precision() {
        let result = Cli::try_parse_from(["echoscribe", "--precision", "sloppy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
