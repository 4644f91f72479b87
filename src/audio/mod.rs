//! Audio capture and hand-off: blocks, the bounded queue, and device sources.

pub mod block;
#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod queue;
pub mod source;
pub mod wav;
