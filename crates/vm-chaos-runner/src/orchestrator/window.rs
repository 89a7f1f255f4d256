//! Chaos time window

use std::time::Duration;

use tokio::time::Instant;

/// The span during which new chaos iterations may start.
///
/// Built on the tokio clock, so paused-time tests observe the same
/// elapsed time the executor does.
#[derive(Debug, Clone, Copy)]
pub struct ChaosWindow {
    start: Instant,
    duration: Duration,
}

impl ChaosWindow {
    /// Open a window starting now
    pub fn start(duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            duration,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// True once `elapsed() >= duration`; never reverts to false
    pub fn expired(&self) -> bool {
        self.elapsed() >= self.duration
    }
}
