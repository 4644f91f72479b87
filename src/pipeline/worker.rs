//! Transcription worker: the dedicated consumer loop.
//!
//! Polls the sample queue, accumulates fixed-length segments, and runs one
//! blocking recognition call per segment. A failed segment is reported as
//! an error marker and never terminates the loop. The capture thread is
//! never stalled; all blocking happens here.

use crate::audio::queue::SampleQueue;
use crate::audio::wav;
use crate::error::{EchoscribeError, Result};
use crate::pipeline::accumulator::SegmentAccumulator;
use crate::pipeline::sink::TranscriptSink;
use crate::pipeline::state::PipelineState;
use crate::pipeline::types::{Segment, SegmentOutcome, Transcript};
use crate::recognize::recognizer::Recognizer;
use std::sync::Arc;
use std::time::Duration;

/// Consumer loop state: queue in, transcripts out.
pub struct TranscriptionWorker {
    queue: Arc<SampleQueue>,
    state: Arc<PipelineState>,
    accumulator: SegmentAccumulator,
    recognizer: Arc<dyn Recognizer>,
    sink: Box<dyn TranscriptSink>,
    sample_rate: u32,
    poll_timeout: Duration,
    quiet: bool,
}

impl TranscriptionWorker {
    /// Creates a worker slicing `segment_len`-sample segments.
    pub fn new(
        queue: Arc<SampleQueue>,
        state: Arc<PipelineState>,
        recognizer: Arc<dyn Recognizer>,
        sink: Box<dyn TranscriptSink>,
        segment_len: usize,
        sample_rate: u32,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            state,
            accumulator: SegmentAccumulator::new(segment_len),
            recognizer,
            sink,
            sample_rate,
            poll_timeout,
            quiet: false,
        }
    }

    /// Suppress stderr diagnostics (dropped-block warnings, per-segment
    /// failure logs).
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Runs the consumer loop until the pipeline state flips to Stopping.
    ///
    /// Each iteration is one cancellation-poll cycle: report queue drops,
    /// wait up to the poll timeout for a block, slice and process every
    /// segment it completes. Partial audio still buffered when the loop
    /// exits is dropped.
    pub fn run(mut self) {
        while self.state.is_running() {
            let dropped = self.queue.take_dropped();
            if dropped > 0 && !self.quiet {
                eprintln!(
                    "echoscribe: queue full — dropped {} oldest audio block(s)",
                    dropped
                );
            }

            let Some(block) = self.queue.pop(self.poll_timeout) else {
                // Timeout is the cancellation-poll point, not an error.
                continue;
            };

            for segment in self.accumulator.push_block(block) {
                let transcript = self.process_segment(segment);
                if let Err(e) = self.sink.handle(&transcript) {
                    eprintln!("echoscribe: {} sink error: {}", self.sink.name(), e);
                }
            }
        }
    }

    /// Recognizes one segment, mapping every failure to an error-marker
    /// transcript so the loop always continues.
    fn process_segment(&self, segment: Segment) -> Transcript {
        let sequence = segment.sequence;

        match self.recognize(&segment) {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Transcript::new(sequence, SegmentOutcome::NoSpeech)
                } else {
                    Transcript::new(sequence, SegmentOutcome::Text(trimmed.to_string()))
                }
            }
            Err(e) => {
                if !self.quiet {
                    eprintln!("echoscribe: segment {} failed: {}", sequence, e);
                }
                Transcript::new(sequence, SegmentOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Writes the segment to a scratch WAV and runs the recognition call.
    ///
    /// The scratch file is removed when `scratch` drops: on success, on
    /// write failure, and on recognition failure alike.
    fn recognize(&self, segment: &Segment) -> Result<String> {
        let scratch = tempfile::Builder::new()
            .prefix("echoscribe-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| EchoscribeError::Resource {
                message: format!("Failed to create scratch WAV: {}", e),
            })?;

        wav::write_wav(scratch.path(), &segment.samples, self.sample_rate)?;
        self.recognizer.transcribe(scratch.path())
    }
}
