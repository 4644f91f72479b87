//! Lifecycle controller: startup ordering and graceful shutdown.
//!
//! A pipeline moves Idle → Running → Stopping → Stopped. [`Pipeline`] is
//! the Idle configuration, [`Pipeline::start`] performs the transition to
//! Running and yields a [`PipelineHandle`], and [`PipelineHandle::stop`]
//! drives Stopping → Stopped, consuming the handle (Stopped is terminal).

use crate::audio::queue::SampleQueue;
use crate::audio::source::CaptureSource;
use crate::defaults;
use crate::error::Result;
use crate::pipeline::sink::TranscriptSink;
use crate::pipeline::state::PipelineState;
use crate::pipeline::worker::TranscriptionWorker;
use crate::recognize::recognizer::Recognizer;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sample rate of the capture stream
    pub sample_rate: u32,
    /// Segment length in seconds
    pub segment_secs: u32,
    /// Capture→worker queue capacity, in blocks
    pub queue_capacity: usize,
    /// Worker poll timeout (cancellation check interval)
    pub poll_timeout: Duration,
    /// Suppress stderr diagnostics
    pub quiet: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            segment_secs: defaults::SEGMENT_SECS,
            queue_capacity: defaults::QUEUE_CAPACITY,
            poll_timeout: Duration::from_millis(defaults::POLL_TIMEOUT_MS),
            quiet: false,
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    state: Arc<PipelineState>,
    capture: Box<dyn CaptureSource>,
    worker: Option<JoinHandle<()>>,
    poll_timeout: Duration,
    quiet: bool,
}

impl PipelineHandle {
    /// Returns true until a stop has been requested.
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Signals Running→Stopping without tearing down.
    ///
    /// Idempotent: returns true only for the call that performed the
    /// transition. Teardown still requires [`stop`](Self::stop).
    pub fn request_stop(&self) -> bool {
        self.state.request_stop()
    }

    /// Stops the pipeline: signal, close the capture stream, drain the
    /// worker.
    ///
    /// The worker is given one poll-timeout window (plus margin) to notice
    /// the stop and exit. A worker still inside a long recognition call
    /// past that deadline is detached with a warning; in-flight inference
    /// is never interrupted, it dies with the process.
    pub fn stop(mut self) {
        self.state.request_stop();

        // Close the stream first so no more driver callbacks arrive.
        if let Err(e) = self.capture.stop() {
            eprintln!("echoscribe: failed to stop audio capture: {}", e);
        }

        let deadline = Instant::now() + self.poll_timeout * 2 + Duration::from_millis(100);
        let poll_interval = Duration::from_millis(10);

        loop {
            if self.worker.as_ref().is_none_or(|h| h.is_finished()) {
                if let Some(handle) = self.worker.take()
                    && let Err(panic_info) = handle.join()
                {
                    let msg = panic_info
                        .downcast_ref::<&str>()
                        .copied()
                        .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                        .unwrap_or("unknown panic");
                    eprintln!("echoscribe: worker thread panicked: {}", msg);
                }
                break;
            }

            if Instant::now() >= deadline {
                if !self.quiet {
                    eprintln!(
                        "echoscribe: shutdown timeout — worker still busy, detaching"
                    );
                }
                // Dropping the JoinHandle detaches the worker; it dies
                // with the process.
                break;
            }

            thread::sleep(poll_interval);
        }
    }
}

/// Capture → queue → worker pipeline.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline in Idle with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Starts the pipeline: Idle → Running.
    ///
    /// Spawns the worker thread first, then opens the capture stream, so
    /// no captured block can ever find the queue unattended. If the
    /// capture fails to start (fatal device error), the worker is torn
    /// back down before the error is returned.
    ///
    /// # Arguments
    /// * `capture` - Audio capture source
    /// * `recognizer` - Speech recognition backend
    /// * `sink` - Transcript output handler
    ///
    /// # Returns
    /// Handle to control and stop the pipeline
    pub fn start(
        self,
        mut capture: Box<dyn CaptureSource>,
        recognizer: Arc<dyn Recognizer>,
        sink: Box<dyn TranscriptSink>,
    ) -> Result<PipelineHandle> {
        let state = Arc::new(PipelineState::new());
        let queue = Arc::new(SampleQueue::bounded(self.config.queue_capacity));

        let segment_len =
            defaults::segment_samples(self.config.sample_rate, self.config.segment_secs);

        let worker = TranscriptionWorker::new(
            queue.clone(),
            state.clone(),
            recognizer,
            sink,
            segment_len,
            self.config.sample_rate,
            self.config.poll_timeout,
        )
        .with_quiet(self.config.quiet);

        let worker_handle = thread::Builder::new()
            .name("echoscribe-worker".to_string())
            .spawn(move || worker.run())?;

        if let Err(e) = capture.start(queue, state.clone()) {
            // Startup device errors are fatal; unwind the worker cleanly.
            state.request_stop();
            if worker_handle.join().is_err() {
                eprintln!("echoscribe: worker thread panicked during startup unwind");
            }
            return Err(e);
        }

        Ok(PipelineHandle {
            state,
            capture,
            worker: Some(worker_handle),
            poll_timeout: self.config.poll_timeout,
            quiet: self.config.quiet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::block::AudioBlock;
    use crate::audio::source::MockCapture;
    use crate::error::EchoscribeError;
    use crate::pipeline::sink::CollectorSink;
    use crate::recognize::recognizer::MockRecognizer;

    fn quick_config() -> PipelineConfig {
        PipelineConfig {
            segment_secs: 1,
            poll_timeout: Duration::from_millis(20),
            quiet: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.segment_secs, 5);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.poll_timeout, Duration::from_millis(100));
        assert!(!config.quiet);
    }

    #[test]
    fn test_start_and_stop_with_mock_capture() {
        // One second of audio at 16kHz in 10 blocks → one 1s segment.
        let blocks = vec![AudioBlock::new(vec![0.1; 1600]); 10];
        let capture = Box::new(MockCapture::new().with_blocks(blocks));
        let recognizer = Arc::new(MockRecognizer::new("mock").with_response("hello"));
        let sink = CollectorSink::new();
        let results = sink.results_handle();

        let pipeline = Pipeline::new(quick_config());
        let handle = pipeline
            .start(capture, recognizer, Box::new(sink))
            .unwrap();
        assert!(handle.is_running());

        // Wait for the segment to be processed
        let deadline = Instant::now() + Duration::from_secs(5);
        while results.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        handle.stop();

        let transcripts = results.transcripts();
        assert_eq!(transcripts.len(), 1);
        assert_eq!(transcripts[0].text(), Some("hello"));
    }

    #[test]
    fn test_start_fails_when_capture_fails() {
        let capture = Box::new(MockCapture::new().with_start_failure());
        let recognizer = Arc::new(MockRecognizer::new("mock"));
        let sink = Box::new(CollectorSink::new());

        let pipeline = Pipeline::new(quick_config());
        let result = pipeline.start(capture, recognizer, sink);

        assert!(result.is_err());
        match result {
            Err(EchoscribeError::AudioCapture { message }) => {
                assert_eq!(message, "mock capture failure");
            }
            _ => panic!("Expected AudioCapture error"),
        }
    }

    #[test]
    fn test_request_stop_is_idempotent() {
        let capture = Box::new(MockCapture::new());
        let recognizer = Arc::new(MockRecognizer::new("mock"));
        let sink = Box::new(CollectorSink::new());

        let pipeline = Pipeline::new(quick_config());
        let handle = pipeline.start(capture, recognizer, sink).unwrap();

        assert!(handle.is_running());
        assert!(handle.request_stop(), "first request performs transition");
        assert!(!handle.request_stop(), "second request is a no-op");
        assert!(!handle.is_running());

        // stop() after an external request must still tear down cleanly
        handle.stop();
    }

    #[test]
    fn test_stop_completes_quickly_when_idle() {
        let capture = Box::new(MockCapture::new());
        let recognizer = Arc::new(MockRecognizer::new("mock"));
        let sink = Box::new(CollectorSink::new());

        let pipeline = Pipeline::new(quick_config());
        let handle = pipeline.start(capture, recognizer, sink).unwrap();

        let start = Instant::now();
        handle.stop();
        let elapsed = start.elapsed();

        assert!(
            elapsed < Duration::from_secs(1),
            "idle stop took {:?}",
            elapsed
        );
    }
}
