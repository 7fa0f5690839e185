//! Mock tick counter for testing.

use core::cell::Cell;

use crate::platform::{traits::TickCounter, Result};

/// Controllable 8-bit counter.
///
/// Tests set or advance the count explicitly, making wraparound behavior
/// deterministic to exercise.
#[derive(Debug, Default)]
pub struct MockTicks {
    count: Cell<u8>,
}

impl MockTicks {
    pub fn new() -> Self {
        Self { count: Cell::new(0) }
    }

    /// Set the counter to an absolute value.
    pub fn set(&self, count: u8) {
        self.count.set(count);
    }

    /// Advance the counter, wrapping like the hardware does.
    pub fn advance(&self, ticks: u8) {
        self.count.set(self.count.get().wrapping_add(ticks));
    }
}

impl TickCounter for MockTicks {
    fn count(&self) -> Result<u8> {
        Ok(self.count.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_advance() {
        let ticks = MockTicks::new();
        assert_eq!(ticks.count().unwrap(), 0);

        ticks.set(200);
        ticks.advance(100);
        assert_eq!(ticks.count().unwrap(), 44); // wrapped
    }
}
