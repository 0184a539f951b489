//! Forward-progress watchdog for driver runs.

use crate::error::{SimError, SimResult};
use crate::types::Cycle;

/// Aborts a run after `threshold` consecutive cycles without output progress.
///
/// Progress is the number of output values captured so far. Because output
/// sequences only grow, an unchanged count means an unchanged output
/// collection.
#[derive(Clone, Debug)]
pub struct LivenessWatchdog {
    threshold: Cycle,
    idle_cycles: Cycle,
    snapshot: usize,
}

impl LivenessWatchdog {
    /// Creates a watchdog with the progress observed before the first cycle.
    pub fn new(threshold: Cycle, initial_progress: usize) -> Self {
        Self {
            threshold,
            idle_cycles: 0,
            snapshot: initial_progress,
        }
    }

    /// Observes the progress after a completed cycle.
    ///
    /// `cycles` is the number of cycles run so far and is reported in the
    /// timeout error.
    pub fn observe(&mut self, cycles: Cycle, progress: usize) -> SimResult<()> {
        if progress != self.snapshot {
            self.snapshot = progress;
            self.idle_cycles = 0;
            return Ok(());
        }
        self.idle_cycles += 1;
        if self.idle_cycles >= self.threshold {
            return Err(SimError::LivenessTimeout {
                cycles,
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    /// Consecutive cycles since the last observed change.
    pub fn idle_cycles(&self) -> Cycle {
        self.idle_cycles
    }

    /// The configured threshold.
    pub fn threshold(&self) -> Cycle {
        self.threshold
    }
}
