//! Recognition collaborator seam: the trait, its pass-through options,
//! and a mock for testing.

use crate::defaults;
use crate::error::{EchoscribeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Speed/quality trade-off passed through to the recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Greedy decoding, fastest; the default.
    Fast,
    /// Beam-search decoding, slower but better on difficult audio.
    Accurate,
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Precision::Fast),
            "accurate" => Ok(Precision::Accurate),
            other => Err(format!(
                "invalid precision '{}' (expected 'fast' or 'accurate')",
                other
            )),
        }
    }
}

/// Pass-through configuration for recognition calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerOptions {
    pub precision: Precision,
    /// Sampling temperature, 0.0–1.0.
    pub temperature: f32,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            precision: Precision::Fast,
            temperature: defaults::DEFAULT_TEMPERATURE,
        }
    }
}

impl RecognizerOptions {
    /// Rejects out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(EchoscribeError::ConfigInvalidValue {
                key: "recognition.temperature".to_string(),
                message: format!("must be between 0.0 and 1.0, got {}", self.temperature),
            });
        }
        Ok(())
    }
}

/// Trait for speech recognition backends.
///
/// This trait allows swapping implementations (real Whisper vs mock). The
/// call is synchronous and may block for seconds; callers own the threading.
pub trait Recognizer: Send + Sync {
    /// Transcribe the WAV file at `audio` to text.
    ///
    /// # Returns
    /// The raw transcribed text (may be empty or whitespace-only) or an
    /// error. Errors are per-call: the same recognizer stays usable for
    /// subsequent segments.
    fn transcribe(&self, audio: &Path) -> Result<String>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the recognizer is ready
    fn is_ready(&self) -> bool;
}

/// Implement Recognizer for Arc<T> to allow sharing across threads.
impl<T: Recognizer + ?Sized> Recognizer for Arc<T> {
    fn transcribe(&self, audio: &Path) -> Result<String> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock recognizer for testing.
///
/// Counts calls so tests can fail a specific segment index, and records
/// the scratch paths it was handed so tests can verify their release.
pub struct MockRecognizer {
    model_name: String,
    response: String,
    should_fail: bool,
    fail_on_calls: Vec<u64>,
    calls: AtomicU64,
    seen_paths: std::sync::Mutex<Vec<PathBuf>>,
}

impl MockRecognizer {
    /// Create a new mock recognizer with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            should_fail: false,
            fail_on_calls: Vec::new(),
            calls: AtomicU64::new(0),
            seen_paths: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on every call
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to fail on specific call indices (0-based).
    ///
    /// With a single worker, call index n corresponds to segment n.
    pub fn with_failure_on_calls(mut self, indices: Vec<u64>) -> Self {
        self.fail_on_calls = indices;
        self
    }

    /// Number of transcribe calls received so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Scratch paths handed to the mock, in call order.
    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }
}

impl Recognizer for MockRecognizer {
    fn transcribe(&self, audio: &Path) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut paths) = self.seen_paths.lock() {
            paths.push(audio.to_path_buf());
        }

        if self.should_fail || self.fail_on_calls.contains(&call) {
            Err(EchoscribeError::Recognition {
                message: "mock recognition failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_recognizer_returns_response() {
        let recognizer = MockRecognizer::new("test-model").with_response("Hello, this is a test");

        let result = recognizer.transcribe(Path::new("/tmp/segment.wav"));

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Hello, this is a test");
    }

    #[test]
    fn test_mock_recognizer_returns_error_when_configured() {
        let recognizer = MockRecognizer::new("test-model").with_failure();

        let result = recognizer.transcribe(Path::new("/tmp/segment.wav"));

        assert!(result.is_err());
        match result {
            Err(EchoscribeError::Recognition { message }) => {
                assert_eq!(message, "mock recognition failure");
            }
            _ => panic!("Expected Recognition error"),
        }
    }

    #[test]
    fn test_mock_recognizer_fails_only_on_configured_calls() {
        let recognizer = MockRecognizer::new("test-model").with_failure_on_calls(vec![2]);

        let path = Path::new("/tmp/segment.wav");
        assert!(recognizer.transcribe(path).is_ok()); // call 0
        assert!(recognizer.transcribe(path).is_ok()); // call 1
        assert!(recognizer.transcribe(path).is_err()); // call 2
        assert!(recognizer.transcribe(path).is_ok()); // call 3
        assert_eq!(recognizer.call_count(), 4);
    }

    #[test]
    fn test_mock_recognizer_records_paths() {
        let recognizer = MockRecognizer::new("test-model");

        recognizer.transcribe(Path::new("/tmp/a.wav")).unwrap();
        recognizer.transcribe(Path::new("/tmp/b.wav")).unwrap();

        assert_eq!(
            recognizer.seen_paths(),
            vec![PathBuf::from("/tmp/a.wav"), PathBuf::from("/tmp/b.wav")]
        );
    }

    #[test]
    fn test_mock_recognizer_is_ready() {
        assert!(MockRecognizer::new("m").is_ready());
        assert!(!MockRecognizer::new("m").with_failure().is_ready());
    }

    #[test]
    fn test_recognizer_trait_is_object_safe() {
        let recognizer: Box<dyn Recognizer> =
            Box::new(MockRecognizer::new("test-model").with_response("boxed test"));

        assert_eq!(recognizer.model_name(), "test-model");
        let result = recognizer.transcribe(Path::new("/tmp/segment.wav"));
        assert_eq!(result.unwrap(), "boxed test");
    }

    #[test]
    fn test_arc_recognizer_shares_call_state() {
        let recognizer = Arc::new(MockRecognizer::new("shared"));
        let clone = recognizer.clone();

        clone.transcribe(Path::new("/tmp/segment.wav")).unwrap();
        assert_eq!(recognizer.call_count(), 1);
    }

    #[test]
    fn test_precision_from_str() {
        assert_eq!("fast".parse::<Precision>(), Ok(Precision::Fast));
        assert_eq!("ACCURATE".parse::<Precision>(), Ok(Precision::Accurate));
        assert!("sloppy".parse::<Precision>().is_err());
    }

    #[test]
    fn test_options_default() {
        let options = RecognizerOptions::default();
        assert_eq!(options.precision, Precision::Fast);
        assert_eq!(options.temperature, 0.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_temperature_range() {
        let valid = RecognizerOptions {
            precision: Precision::Accurate,
            temperature: 1.0,
        };
        assert!(valid.validate().is_ok());

        let too_hot = RecognizerOptions {
            precision: Precision::Fast,
            temperature: 1.5,
        };
        let result = too_hot.validate();
        assert!(matches!(
            result,
            Err(EchoscribeError::ConfigInvalidValue { .. })
        ));

        let negative = RecognizerOptions {
            precision: Precision::Fast,
            temperature: -0.1,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_options_serde_roundtrip() {
        let options = RecognizerOptions {
            precision: Precision::Accurate,
            temperature: 0.4,
        };
        let toml_str = toml::to_string(&options).unwrap();
        let parsed: RecognizerOptions = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, options);
    }
}
