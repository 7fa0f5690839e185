//! Gyroscope integration.
//!
//! Integrates body-frame angular rate into the working attitude quaternion
//! using the first-order quaternion derivative. The elapsed time comes from
//! the 8-bit tick counter captured together with the rate sample.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::ticks::TickDelta;

/// Dead-reckoning attitude propagator.
///
/// Holds the working earth-to-body attitude between cycles. The fuser writes
/// the blended estimate back through [`GyroPredictor::reseed`] so the next
/// integration step starts from the published attitude rather than the
/// uncorrected dead-reckoned one.
pub struct GyroPredictor {
    attitude: UnitQuaternion<f32>,
    tick_hz: f32,
}

impl GyroPredictor {
    /// Create a predictor at the identity attitude.
    ///
    /// `tick_hz` is the rate of the free-running counter that timestamps the
    /// gyroscope samples.
    pub fn new(tick_hz: f32) -> Self {
        Self {
            attitude: UnitQuaternion::identity(),
            tick_hz,
        }
    }

    /// Current working attitude (earth frame into body frame).
    pub fn attitude(&self) -> UnitQuaternion<f32> {
        self.attitude
    }

    /// Overwrite the working attitude with a fused or seeded estimate.
    pub fn reseed(&mut self, attitude: UnitQuaternion<f32>) {
        self.attitude = attitude;
    }

    /// Advance the attitude by one gyroscope sample.
    ///
    /// The rotation increment over the interval is approximated to first
    /// order as `(1, w * dt / 2)` and composed onto the working attitude.
    /// The result is renormalized on every step; without that, accumulated
    /// floating-point error lets the norm drift without bound over a long
    /// run.
    ///
    /// # Arguments
    ///
    /// * `rate` - body-frame angular rate in rad/s
    /// * `delta` - elapsed ticks since the previous gyroscope sample
    pub fn integrate(&mut self, rate: Vector3<f32>, delta: TickDelta) -> UnitQuaternion<f32> {
        let half_dt = 0.5 * delta.as_seconds(self.tick_hz);
        let increment = Quaternion::new(
            1.0,
            rate.x * half_dt,
            rate.y * half_dt,
            rate.z * half_dt,
        );

        // from_quaternion normalizes, keeping the unit-norm invariant.
        self.attitude = UnitQuaternion::from_quaternion(self.attitude.into_inner() * increment);
        self.attitude
    }
}
