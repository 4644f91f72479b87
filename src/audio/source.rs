//! Capture source seam between the controller and the audio device.

use crate::audio::block::AudioBlock;
use crate::audio::queue::SampleQueue;
use crate::error::{EchoscribeError, Result};
use crate::pipeline::state::PipelineState;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Trait for audio capture sources.
///
/// This trait allows swapping implementations (real device vs mock). The
/// source pushes [`AudioBlock`]s into the queue from its own execution
/// context; once the shared state is Stopping it must stop enqueueing,
/// and `stop` must end delivery entirely.
pub trait CaptureSource: Send {
    /// Start capturing, pushing blocks into `queue` while `state` is
    /// running.
    ///
    /// # Errors
    /// Returns an error if the underlying device cannot be opened, which
    /// is fatal at startup.
    fn start(&mut self, queue: Arc<SampleQueue>, state: Arc<PipelineState>) -> Result<()>;

    /// Stop capturing. After this returns no more blocks are delivered.
    fn stop(&mut self) -> Result<()>;
}

/// Mock capture source for testing.
///
/// Feeds a scripted sequence of blocks from a background thread, pacing
/// them at a configurable interval, then goes quiet. Stops early if the
/// pipeline state flips to Stopping, like a real callback would.
pub struct MockCapture {
    blocks: Vec<AudioBlock>,
    interval: Duration,
    should_fail_start: bool,
    feeder: Option<JoinHandle<()>>,
}

impl MockCapture {
    /// Create a mock capture with no blocks to deliver.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            interval: Duration::ZERO,
            should_fail_start: false,
            feeder: None,
        }
    }

    /// Configure the blocks delivered after `start`.
    pub fn with_blocks(mut self, blocks: Vec<AudioBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Configure a delay between delivered blocks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for MockCapture {
    fn start(&mut self, queue: Arc<SampleQueue>, state: Arc<PipelineState>) -> Result<()> {
        if self.should_fail_start {
            return Err(EchoscribeError::AudioCapture {
                message: "mock capture failure".to_string(),
            });
        }

        let blocks = std::mem::take(&mut self.blocks);
        let interval = self.interval;
        self.feeder = Some(std::thread::spawn(move || {
            for block in blocks {
                if !state.is_running() {
                    break;
                }
                queue.push(block);
                if !interval.is_zero() {
                    std::thread::sleep(interval);
                }
            }
        }));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(feeder) = self.feeder.take()
            && feeder.join().is_err()
        {
            return Err(EchoscribeError::AudioCapture {
                message: "mock feeder thread panicked".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_delivers_all_blocks() {
        let queue = Arc::new(SampleQueue::bounded(16));
        let state = Arc::new(PipelineState::new());

        let blocks = vec![
            AudioBlock::new(vec![0.1; 100]),
            AudioBlock::new(vec![0.2; 100]),
            AudioBlock::new(vec![0.3; 100]),
        ];
        let mut capture = MockCapture::new().with_blocks(blocks.clone());

        capture.start(queue.clone(), state.clone()).unwrap();
        capture.stop().unwrap();

        for expected in blocks {
            assert_eq!(queue.pop(Duration::from_millis(100)), Some(expected));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_mock_start_failure() {
        let queue = Arc::new(SampleQueue::bounded(16));
        let state = Arc::new(PipelineState::new());

        let mut capture = MockCapture::new().with_start_failure();
        let result = capture.start(queue, state);

        assert!(result.is_err());
        match result {
            Err(EchoscribeError::AudioCapture { message }) => {
                assert_eq!(message, "mock capture failure");
            }
            _ => panic!("Expected AudioCapture error"),
        }
    }

    #[test]
    fn test_mock_respects_stopping_state() {
        let queue = Arc::new(SampleQueue::bounded(256));
        let state = Arc::new(PipelineState::new());
        state.request_stop();

        let blocks = vec![AudioBlock::new(vec![0.0; 100]); 10];
        let mut capture = MockCapture::new().with_blocks(blocks);

        capture.start(queue.clone(), state).unwrap();
        capture.stop().unwrap();

        // State was already Stopping, so nothing should be enqueued
        assert!(queue.is_empty());
    }

    #[test]
    fn test_mock_stop_without_start() {
        let mut capture = MockCapture::new();
        assert!(capture.stop().is_ok());
    }

    #[test]
    fn test_capture_source_is_object_safe() {
        let _capture: Box<dyn CaptureSource> = Box::new(MockCapture::new());
    }
}
