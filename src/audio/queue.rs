//! Bounded hand-off queue between the capture callback and the worker.
//!
//! The producer side must be safe to call from a real-time audio callback:
//! `push` never blocks and never allocates beyond what the caller already
//! did. Overflow policy is drop-oldest: the oldest queued block is
//! discarded and counted, never silently. The worker reads the counter at
//! its next poll boundary and logs the total, so the audio thread itself
//! never performs I/O.

use crate::audio::block::AudioBlock;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Thread-safe FIFO of audio blocks with a fixed capacity.
///
/// Both ends live in the same struct; share it between the capture thread
/// and the worker via `Arc`.
pub struct SampleQueue {
    tx: Sender<AudioBlock>,
    rx: Receiver<AudioBlock>,
    dropped: AtomicU64,
}

impl SampleQueue {
    /// Creates a queue holding at most `capacity` blocks.
    ///
    /// A capacity of zero is clamped to one; a rendezvous channel would
    /// make `push` block, which the capture callback must never do.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            tx,
            rx,
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueues a block without ever blocking the caller.
    ///
    /// If the queue is full, the oldest queued block is discarded (and
    /// counted) to make room. Safe to call from the audio callback.
    pub fn push(&self, block: AudioBlock) {
        let mut block = block;
        loop {
            match self.tx.try_send(block) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    // Drop-oldest: discard the head and retry with the
                    // rejected block.
                    if self.rx.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    block = rejected;
                }
                // Both ends live in self, so the channel cannot disconnect
                // while the queue is alive.
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Dequeues the oldest block, waiting up to `timeout`.
    ///
    /// Returns `None` on timeout so the caller can re-check the pipeline
    /// state. A timeout is a normal poll signal, not an error.
    pub fn pop(&self, timeout: Duration) -> Option<AudioBlock> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Returns the total of blocks dropped since the last call, resetting
    /// the counter.
    pub fn take_dropped(&self) -> u64 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Number of blocks currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if no blocks are queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
