use std::time::Duration;

use super::session::SessionId;

/// Timing and bookkeeping for one published frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Count of frames published so far, starting at 1
    pub number: u64,
    pub session: SessionId,
    pub width: u32,
    pub height: u32,
    /// Dispatch to swap
    pub elapsed: Duration,
    /// Animation clock the frame was rendered at, in seconds
    pub animation_time: f32,
    /// Parameter revision current when the frame was dispatched
    pub param_revision: u64,
    /// Tile results discarded so far
    pub dropped_results: u64,
}

impl FrameStats {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}
