//! echoscribe - Live microphone transcription in fixed-length segments
//!
//! Captures a live microphone signal, slices it into fixed-duration
//! segments, and transcribes each segment with a pluggable speech
//! recognition backend, reporting results as they complete.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod recognize;

// Composition root - needs everything
#[cfg(all(feature = "cpal-audio", feature = "whisper", feature = "cli"))]
pub mod app;

// Core traits (source → process → sink)
pub use audio::source::CaptureSource;
pub use pipeline::sink::{CollectorHandle, CollectorSink, StdoutSink, TranscriptSink};
pub use recognize::recognizer::{Precision, Recognizer, RecognizerOptions};

// Pipeline
pub use pipeline::controller::{Pipeline, PipelineConfig, PipelineHandle};
pub use pipeline::state::PipelineState;
pub use pipeline::types::{Segment, SegmentOutcome, Transcript};

// Error handling
pub use error::{EchoscribeError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
