//! Whisper-based speech recognition.
//!
//! Implements the Recognizer trait with whisper-rs. Reads each scratch WAV
//! back as normalized f32 audio and runs blocking inference on it.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be
//! installed. To build with Whisper support:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::defaults;
use crate::error::{EchoscribeError, Result};
use crate::recognize::recognizer::{Recognizer, RecognizerOptions};
use std::path::{Path, PathBuf};

#[cfg(feature = "whisper")]
use crate::audio::wav;
#[cfg(feature = "whisper")]
use crate::recognize::recognizer::Precision;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for the Whisper recognizer.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,
    /// Language code (e.g., "en", "es") or "auto"
    pub language: String,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
    /// Pass-through recognition options
    pub options: RecognizerOptions,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
            options: RecognizerOptions::default(),
        }
    }
}

/// Whisper-based recognizer implementation.
///
/// The WhisperContext is wrapped in a Mutex; recognition calls are
/// serialized, which matches the single-worker pipeline.
#[cfg(feature = "whisper")]
pub struct WhisperRecognizer {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper recognizer placeholder (without whisper feature).
///
/// This is a stub implementation that returns errors when used.
/// Enable the `whisper` feature to use real recognition.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperRecognizer {
    config: WhisperConfig,
    model_name: String,
}

/// Extract a display model name from the model file path.
fn model_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
impl WhisperRecognizer {
    /// Create a new Whisper recognizer, loading the model eagerly.
    ///
    /// # Errors
    /// Returns `EchoscribeError::RecognitionModelNotFound` if the model
    /// file doesn't exist, `EchoscribeError::Recognition` if loading fails.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        config.options.validate()?;

        if !config.model_path.exists() {
            return Err(EchoscribeError::RecognitionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_from_path(&config.model_path);

        let context_params = WhisperContextParameters::default();
        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| EchoscribeError::Recognition {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| EchoscribeError::Recognition {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    /// Build inference parameters from the pass-through options.
    fn build_params(&self) -> FullParams<'_, '_> {
        // Precision maps onto the decoding strategy: fast = greedy,
        // accurate = beam search.
        let strategy = match self.config.options.precision {
            Precision::Fast => SamplingStrategy::Greedy { best_of: 1 },
            Precision::Accurate => SamplingStrategy::BeamSearch {
                beam_size: 5,
                patience: 1.0,
            },
        };
        let mut params = FullParams::new(strategy);

        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        params.set_temperature(self.config.options.temperature);

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        params
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperRecognizer {
    /// Create a new Whisper recognizer (stub implementation).
    pub fn new(config: WhisperConfig) -> Result<Self> {
        config.options.validate()?;

        if !config.model_path.exists() {
            return Err(EchoscribeError::RecognitionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_from_path(&config.model_path);

        Ok(Self { config, model_name })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(feature = "whisper")]
impl Recognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &Path) -> Result<String> {
        let samples = wav::read_wav(audio)?;

        let context = self
            .context
            .lock()
            .map_err(|e| EchoscribeError::Recognition {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        let mut state = context
            .create_state()
            .map_err(|e| EchoscribeError::Recognition {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let params = self.build_params();

        state
            .full(params, &samples)
            .map_err(|e| EchoscribeError::Recognition {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let mut transcription = String::new();
        for segment in state.as_iter() {
            transcription.push_str(&segment.to_string());
        }

        Ok(transcription)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl Recognizer for WhisperRecognizer {
    fn transcribe(&self, _audio: &Path) -> Result<String> {
        Err(EchoscribeError::Recognition {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whisper_config_default() {
        let config = WhisperConfig::default();
        assert_eq!(config.model_path, PathBuf::from("models/ggml-base.en.bin"));
        assert_eq!(config.language, defaults::AUTO_LANGUAGE);
        assert_eq!(config.threads, None);
        assert_eq!(config.options, RecognizerOptions::default());
    }

    #[test]
    fn test_new_fails_for_missing_model() {
        let config = WhisperConfig {
            model_path: PathBuf::from("/nonexistent/model.bin"),
            ..Default::default()
        };

        let result = WhisperRecognizer::new(config);
        assert!(result.is_err());

        match result {
            Err(EchoscribeError::RecognitionModelNotFound { path }) => {
                assert_eq!(path, "/nonexistent/model.bin");
            }
            _ => panic!("Expected RecognitionModelNotFound error"),
        }
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let config = WhisperConfig {
            options: RecognizerOptions {
                temperature: 3.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let result = WhisperRecognizer::new(config);
        assert!(matches!(
            result,
            Err(EchoscribeError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn test_model_name_from_path() {
        assert_eq!(
            model_name_from_path(Path::new("/models/ggml-base.en.bin")),
            "ggml-base.en"
        );
        assert_eq!(model_name_from_path(Path::new("model.bin")), "model");
    }

    #[test]
    fn test_whisper_config_clone_and_debug() {
        let config = WhisperConfig::default();
        let cloned = config.clone();
        assert_eq!(config.model_path, cloned.model_path);

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("WhisperConfig"));
        assert!(debug_str.contains("model_path"));
    }

    #[test]
    fn test_recognizer_trait_bounds() {
        fn _assert_recognizer_trait_bounds<T: Recognizer>() {}
        _assert_recognizer_trait_bounds::<WhisperRecognizer>();
    }

    // Integration tests: run automatically when a model is installed,
    // skip quietly otherwise.

    /// Look for a model file in the cache dir and local `models/` dir.
    #[cfg(feature = "whisper")]
    fn find_any_model() -> Option<PathBuf> {
        const MODEL_CANDIDATES: &[&str] =
            &["base.en", "small.en", "tiny.en", "base", "small", "tiny"];

        for name in MODEL_CANDIDATES {
            let filename = format!("ggml-{}.bin", name);
            if let Ok(home) = std::env::var("HOME") {
                let path = PathBuf::from(home)
                    .join(".cache/echoscribe/models")
                    .join(&filename);
                if path.exists() {
                    return Some(path);
                }
            }
            let local = PathBuf::from("models").join(&filename);
            if local.exists() {
                return Some(local);
            }
        }
        eprintln!("echoscribe: no whisper model installed, skipping test");
        None
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_transcribe_silence_with_real_model() {
        let Some(model_path) = find_any_model() else {
            return;
        };

        let config = WhisperConfig {
            model_path,
            language: "en".to_string(),
            threads: Some(4),
            options: RecognizerOptions::default(),
        };

        let recognizer = WhisperRecognizer::new(config).unwrap();
        assert!(recognizer.is_ready());

        let dir = tempfile::tempdir().unwrap();
        let wav_path = dir.path().join("silence.wav");
        wav::write_wav(&wav_path, &vec![0.0f32; 16000], 16000).unwrap();

        let result = recognizer.transcribe(&wav_path);
        assert!(result.is_ok(), "silence should transcribe without error");
    }
}
