//! Free-running tick counter trait and sampling helper.

use oarsense_core::ticks::TickDelta;

use crate::platform::Result;

/// Free-running 8-bit hardware counter.
///
/// The counter is incremented by hardware and also read from interrupt
/// context for unrelated bookkeeping; it is the single time base for sensor
/// sample timestamps. Implementations return the instantaneous count; all
/// read-then-diff sequencing is done by [`TickSampler`] under a critical
/// section.
pub trait TickCounter {
    fn count(&self) -> Result<u8>;
}

/// Per-sensor elapsed-tick tracker.
///
/// Each sensor keeps its own sampler so its delta measures the distance to
/// the previous sample of the *same* sensor. The count is captured and
/// differenced inside one `critical_section::with` scope so an interrupt
/// cannot tear the sequence.
pub struct TickSampler {
    previous: u8,
}

impl TickSampler {
    pub fn new() -> Self {
        Self { previous: 0 }
    }

    /// Capture the counter and return the elapsed ticks since the previous
    /// capture.
    pub fn sample<T: TickCounter>(&mut self, counter: &T) -> Result<TickDelta> {
        critical_section::with(|_cs| {
            let now = counter.count()?;
            let delta = TickDelta::between(self.previous, now);
            self.previous = now;
            Ok(delta)
        })
    }

    /// Re-align to the current count without producing a delta.
    ///
    /// Used when a sensor restarts after a gap that would otherwise alias
    /// into a bogus small delta.
    pub fn resync<T: TickCounter>(&mut self, counter: &T) -> Result<()> {
        critical_section::with(|_cs| {
            self.previous = counter.count()?;
            Ok(())
        })
    }
}

impl Default for TickSampler {
    fn default() -> Self {
        Self::new()
    }
}
