//! Quaternion attitude estimation.
//!
//! The estimation pipeline runs once per control cycle:
//!
//! ```text
//!  gyro rate + tick delta ──▶ predictor ──▶ candidate attitude
//!  accelerometer reading ──▶ corrector ──▶ tilt correction
//!  magnetometer reading  ──▶ corrector ──▶ heading correction
//!                             fuser    ──▶ published estimate
//! ```
//!
//! The [`estimator::AttitudeEstimator`] owns all cross-cycle state and is the
//! only writer of the attitude; everything else in this module is arithmetic
//! over values passed in by the caller.

pub mod calibration;
pub mod corrector;
pub mod estimator;
pub mod euler;
pub mod fuser;
pub mod predictor;
pub mod reference;

pub use calibration::{AxisMaxima, AxisScales, CalibrationError, CAL_SAMPLES};
pub use corrector::VectorCorrector;
pub use estimator::{
    AttitudeEstimate, AttitudeEstimator, CycleInput, EstimateQuality, EstimatorConfig, GyroSample,
};
pub use euler::EulerAngles;
pub use fuser::{Fuser, FuserConfig};
pub use predictor::GyroPredictor;
pub use reference::{MagReference, REFERENCE_RECORD_LEN};
