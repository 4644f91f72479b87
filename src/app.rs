//! Listen command: the composition root.
//!
//! Wires capture → pipeline → recognition → stdout, waits for Ctrl+C, and
//! shuts everything down in order.

use crate::audio::capture::{CpalCapture, suppress_audio_warnings};
use crate::audio::source::CaptureSource;
use crate::config::Config;
use crate::error::{EchoscribeError, Result};
use crate::pipeline::controller::{Pipeline, PipelineConfig};
use crate::pipeline::sink::StdoutSink;
use crate::recognize::recognizer::Recognizer;
use crate::recognize::whisper::{WhisperConfig, WhisperRecognizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Resolve a model name or path to a model file on disk.
///
/// A value that exists as a path is used directly; otherwise the name is
/// looked up in the cache dir (~/.cache/echoscribe/models/ggml-<name>.bin)
/// and a local models/ directory.
fn resolve_model_path(model: &str) -> Result<PathBuf> {
    let direct = Path::new(model);
    if direct.exists() {
        return Ok(direct.to_path_buf());
    }

    let filename = format!("ggml-{}.bin", model);

    if let Some(cache) = dirs::cache_dir() {
        let cached = cache.join("echoscribe/models").join(&filename);
        if cached.exists() {
            return Ok(cached);
        }
    }

    let local = PathBuf::from("models").join(&filename);
    if local.exists() {
        return Ok(local);
    }

    Err(EchoscribeError::RecognitionModelNotFound {
        path: filename,
    })
}

/// Run the listen command: capture audio → segment → recognize → print.
///
/// Blocks until Ctrl+C, then stops the pipeline gracefully. A second
/// Ctrl+C during shutdown is absorbed by the idempotent stop transition.
pub async fn run_listen_command(config: Config, quiet: bool, verbosity: u8) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    suppress_audio_warnings();

    config.validate()?;

    // Load the model once before the pipeline starts (the slow part)
    if !quiet {
        eprintln!("Loading model '{}'...", config.recognition.model);
    }
    let model_path = resolve_model_path(&config.recognition.model)?;
    let recognizer: Arc<dyn Recognizer> = Arc::new(WhisperRecognizer::new(WhisperConfig {
        model_path,
        language: config.recognition.language.clone(),
        threads: None,
        options: config.recognition.options(),
    })?);

    if verbosity >= 1 {
        eprintln!("Model '{}' ready.", recognizer.model_name());
    }

    let pipeline_config = PipelineConfig {
        sample_rate: config.audio.sample_rate,
        segment_secs: config.segmenter.segment_secs,
        queue_capacity: config.segmenter.queue_capacity,
        poll_timeout: Duration::from_millis(config.segmenter.poll_timeout_ms),
        quiet,
    };

    let capture: Box<dyn CaptureSource> =
        Box::new(CpalCapture::with_sample_rate(config.audio.sample_rate));

    let pipeline = Pipeline::new(pipeline_config);
    let handle = pipeline.start(capture, recognizer, Box::new(StdoutSink))?;

    if !quiet {
        eprintln!(
            "Listening... (transcribing every {}s, Ctrl+C to stop)",
            config.segmenter.segment_secs
        );
    }

    // Wait for Ctrl+C
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| EchoscribeError::Other(format!("Failed to wait for Ctrl+C: {}", e)))?;

    if !quiet {
        eprintln!("\nShutting down...");
    }

    handle.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_path_direct_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = resolve_model_path(&file.path().to_string_lossy()).unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn test_resolve_model_path_unknown_name() {
        let result = resolve_model_path("definitely-not-a-model-xyz");
        assert!(matches!(
            result,
            Err(EchoscribeError::RecognitionModelNotFound { .. })
        ));
    }
}
