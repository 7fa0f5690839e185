//! Attitude estimation tasks.
//!
//! Ties the core pipeline to the platform: startup calibration and reference
//! persistence, the per-cycle sensor polling loop, and the shared published
//! estimate other tasks read from.
//!
//! Lifecycle: `Init -> Calibrating -> Running`. A failed calibration leaves
//! the task refusing to run cycles; nothing else is terminal short of
//! power-off.

pub mod calibrate;
pub mod state;
pub mod task;

pub use state::SharedAttitudeState;
pub use task::{EstimatorTask, Phase, TaskConfig};

use oarsense_core::ahrs::CalibrationError;

use crate::platform::PlatformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EstimatorError {
    /// A bus, UART or storage operation failed.
    Platform(PlatformError),
    /// Calibration could not produce a usable reference; the task must not
    /// enter the running phase.
    Calibration(CalibrationError),
    /// A cycle was requested before startup completed.
    NotRunning,
}

impl From<PlatformError> for EstimatorError {
    fn from(e: PlatformError) -> Self {
        EstimatorError::Platform(e)
    }
}

impl From<CalibrationError> for EstimatorError {
    fn from(e: CalibrationError) -> Self {
        EstimatorError::Calibration(e)
    }
}
