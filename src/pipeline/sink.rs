//! Transcript output handlers.

use crate::defaults;
use crate::error::Result;
use crate::pipeline::types::{SegmentOutcome, Transcript};
use std::sync::{Arc, Mutex};

/// Pluggable output handler for transcripts.
/// Pairs with CaptureSource for input; this handles recognition output.
pub trait TranscriptSink: Send + 'static {
    /// Handle one transcript. Called for each segment, in sequence order.
    fn handle(&mut self, transcript: &Transcript) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Prints one line per transcript to stdout as results complete.
///
/// Every segment's outcome is surfaced: the text, the no-speech marker,
/// or the error marker.
pub struct StdoutSink;

impl TranscriptSink for StdoutSink {
    fn handle(&mut self, transcript: &Transcript) -> Result<()> {
        match &transcript.outcome {
            SegmentOutcome::Text(text) => {
                println!("[{}] {}", transcript.sequence, text);
            }
            SegmentOutcome::NoSpeech => {
                println!("[{}] ({})", transcript.sequence, defaults::NO_SPEECH_MARKER);
            }
            SegmentOutcome::Failed(message) => {
                println!("[{}] error: {}", transcript.sequence, message);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Collects transcripts for tests and library use.
///
/// The sink itself moves into the worker; keep the [`CollectorHandle`] to
/// inspect results from outside.
pub struct CollectorSink {
    collected: Arc<Mutex<Vec<Transcript>>>,
}

/// Shared read handle over a [`CollectorSink`]'s results.
#[derive(Clone)]
pub struct CollectorHandle {
    collected: Arc<Mutex<Vec<Transcript>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            collected: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a handle that stays valid after the sink moves into the
    /// pipeline.
    pub fn results_handle(&self) -> CollectorHandle {
        CollectorHandle {
            collected: self.collected.clone(),
        }
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSink for CollectorSink {
    fn handle(&mut self, transcript: &Transcript) -> Result<()> {
        if let Ok(mut collected) = self.collected.lock() {
            collected.push(transcript.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

impl CollectorHandle {
    /// Snapshot of the transcripts collected so far.
    pub fn transcripts(&self) -> Vec<Transcript> {
        self.collected
            .lock()
            .map(|collected| collected.clone())
            .unwrap_or_default()
    }

    /// Number of transcripts collected so far.
    pub fn len(&self) -> usize {
        self.collected.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns true if nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
