//! Default configuration constants for echoscribe.
//!
//! Shared constants used across configuration types to keep the audio,
//! segmenter, and recognition layers consistent.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and what Whisper models
/// are trained on.
pub const SAMPLE_RATE: u32 = 16000;

/// Default segment length in seconds.
///
/// Each segment is exactly this long; the worker submits one recognition
/// call per segment.
pub const SEGMENT_SECS: u32 = 5;

/// Default worker poll timeout in milliseconds.
///
/// Upper bound on how long the worker blocks waiting for an audio block
/// before re-checking the pipeline state. This is the shutdown latency of
/// an idle worker.
pub const POLL_TIMEOUT_MS: u64 = 100;

/// Default capacity of the capture→worker queue, in audio blocks.
///
/// At typical device block sizes (10–50ms) this buffers several seconds
/// of audio before the drop-oldest policy kicks in.
pub const QUEUE_CAPACITY: usize = 1024;

/// Default Whisper model name.
pub const DEFAULT_MODEL: &str = "base.en";

/// Default language code for recognition.
///
/// "auto" lets the engine detect the spoken language. Set a specific code
/// (e.g., "en", "de") to force a language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default sampling temperature passed through to the recognition engine.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Marker text reported for a segment whose recognition result is empty.
pub const NO_SPEECH_MARKER: &str = "no speech detected";

/// Number of samples in one segment at the given rate and length.
pub const fn segment_samples(sample_rate: u32, segment_secs: u32) -> usize {
    (sample_rate * segment_secs) as usize
}
