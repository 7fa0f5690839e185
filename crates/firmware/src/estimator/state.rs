//! Shared published estimate.
//!
//! The estimator task is the only writer; telemetry and display code read
//! copies. Reads and writes are whole-struct copies under a critical
//! section, which is cheaper than a mutex for data this small and safe
//! against interrupt-context readers.

use core::cell::UnsafeCell;

use oarsense_core::ahrs::AttitudeEstimate;

pub struct SharedAttitudeState {
    state: UnsafeCell<Option<AttitudeEstimate>>,
}

// Safety: the cell is only accessed inside critical sections, and the
// payload is a plain Copy struct with no interior pointers.
unsafe impl Sync for SharedAttitudeState {}
unsafe impl Send for SharedAttitudeState {}

impl SharedAttitudeState {
    /// Create an empty slot; reads return `None` until the first publish.
    pub const fn new() -> Self {
        Self {
            state: UnsafeCell::new(None),
        }
    }

    /// Copy out the most recent published estimate.
    pub fn read(&self) -> Option<AttitudeEstimate> {
        critical_section::with(|_cs| unsafe { *self.state.get() })
    }

    /// Publish a new estimate.
    pub fn write(&self, estimate: AttitudeEstimate) {
        critical_section::with(|_cs| unsafe {
            *self.state.get() = Some(estimate);
        });
    }
}

impl Default for SharedAttitudeState {
    fn default() -> Self {
        Self::new()
    }
}
