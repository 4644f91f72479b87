//! Configuration loading and validation.

use crate::defaults;
use crate::error::{EchoscribeError, Result};
use crate::recognize::recognizer::{Precision, RecognizerOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub segmenter: SegmenterConfig,
    pub recognition: RecognitionConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
}

/// Segmenter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Segment length in seconds
    pub segment_secs: u32,
    /// Capture→worker queue capacity, in blocks
    pub queue_capacity: usize,
    /// Worker poll timeout in milliseconds
    pub poll_timeout_ms: u64,
}

/// Speech recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Model name (resolved in the cache dir) or a direct path
    pub model: String,
    /// Language code or "auto"
    pub language: String,
    /// Decoding speed/quality trade-off
    pub precision: Precision,
    /// Sampling temperature, 0.0–1.0
    pub temperature: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            segment_secs: defaults::SEGMENT_SECS,
            queue_capacity: defaults::QUEUE_CAPACITY,
            poll_timeout_ms: defaults::POLL_TIMEOUT_MS,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            precision: Precision::Fast,
            temperature: defaults::DEFAULT_TEMPERATURE,
        }
    }
}

impl RecognitionConfig {
    /// Pass-through options for the recognition backend.
    pub fn options(&self) -> RecognizerOptions {
        RecognizerOptions {
            precision: self.precision,
            temperature: self.temperature,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EchoscribeError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                EchoscribeError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file
    /// doesn't exist.
    ///
    /// Invalid TOML is still an error; only a missing file falls back.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(EchoscribeError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Default config file path (~/.config/echoscribe/config.toml).
    #[cfg(feature = "cli")]
    pub fn default_path() -> std::path::PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("echoscribe")
            .join("config.toml")
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - ECHOSCRIBE_MODEL → recognition.model
    /// - ECHOSCRIBE_LANGUAGE → recognition.language
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("ECHOSCRIBE_MODEL")
            && !model.is_empty()
        {
            self.recognition.model = model;
        }
        if let Ok(language) = std::env::var("ECHOSCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.recognition.language = language;
        }
        self
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(EchoscribeError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.segmenter.segment_secs == 0 {
            return Err(EchoscribeError::ConfigInvalidValue {
                key: "segmenter.segment_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.segmenter.poll_timeout_ms == 0 {
            return Err(EchoscribeError::ConfigInvalidValue {
                key: "segmenter.poll_timeout_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        self.recognition.options().validate()
    }
}
