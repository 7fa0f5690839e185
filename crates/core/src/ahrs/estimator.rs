//! Cycle-level estimation pipeline.
//!
//! [`AttitudeEstimator`] owns the predictor, corrector and fuser, plus the
//! corrections carried over from earlier cycles. The caller collects
//! whatever sensor data is ready this cycle into a [`CycleInput`] and gets
//! back the published [`AttitudeEstimate`]; a sensor that was not ready
//! simply keeps contributing its stale correction while prediction advances.

use bitflags::bitflags;
use nalgebra::{UnitQuaternion, Vector3};

use super::corrector::{alignment, VectorCorrector};
use super::euler::EulerAngles;
use super::fuser::{Fuser, FuserConfig};
use super::predictor::GyroPredictor;
use super::reference::MagReference;
use crate::ticks::TickDelta;

bitflags! {
    /// Per-cycle quality indicators on a published estimate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EstimateQuality: u8 {
        /// The gyroscope contributed a fresh sample this cycle.
        const RATE_FRESH = 1 << 0;
        /// The accelerometer correction was recomputed this cycle.
        const TILT_FRESH = 1 << 1;
        /// The magnetometer correction was recomputed this cycle.
        const HEADING_FRESH = 1 << 2;
        /// The initial attitude was seeded from a gravity measurement.
        const SEEDED = 1 << 3;
    }
}

/// One gyroscope sample: the rate and its tick delta, captured atomically
/// together by the driver.
#[derive(Debug, Clone, Copy)]
pub struct GyroSample {
    /// Body-frame angular rate in rad/s.
    pub rate: Vector3<f32>,
    /// Elapsed ticks since the previous gyroscope sample.
    pub delta: TickDelta,
}

/// Everything the cycle collected for one estimator update.
///
/// Owned by the main cycle and passed in by reference; the estimator never
/// retains any part of it across calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleInput {
    pub gyro: Option<GyroSample>,
    /// Accelerometer reading in m/s^2, body frame.
    pub accel: Option<Vector3<f32>>,
    /// Magnetometer reading in gauss, body frame, axis scales applied.
    pub mag: Option<Vector3<f32>>,
}

/// A published orientation estimate.
///
/// Always unit norm; overwritten every cycle, never rolled back.
#[derive(Debug, Clone, Copy)]
pub struct AttitudeEstimate {
    /// Earth-to-body attitude.
    pub attitude: UnitQuaternion<f32>,
    pub quality: EstimateQuality,
}

impl AttitudeEstimate {
    /// Derived Euler triple for display and telemetry.
    pub fn euler(&self) -> EulerAngles {
        EulerAngles::from_quaternion(&self.attitude)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EstimatorConfig {
    /// Rate of the free-running tick counter timestamping gyro samples.
    pub tick_hz: f32,
    pub fuser: FuserConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            tick_hz: 1000.0, // millisecond tick from the timer overflow chain
            fuser: FuserConfig::default(),
        }
    }
}

/// Owner of all cross-cycle estimation state.
pub struct AttitudeEstimator {
    predictor: GyroPredictor,
    corrector: VectorCorrector,
    fuser: Fuser,
    tilt: UnitQuaternion<f32>,
    heading: UnitQuaternion<f32>,
    seeded: bool,
}

impl AttitudeEstimator {
    pub fn new(reference: &MagReference, config: EstimatorConfig) -> Self {
        Self {
            predictor: GyroPredictor::new(config.tick_hz),
            corrector: VectorCorrector::new(reference),
            fuser: Fuser::new(config.fuser),
            tilt: UnitQuaternion::identity(),
            heading: UnitQuaternion::identity(),
            seeded: false,
        }
    }

    /// Align the initial attitude so a measured gravity vector maps onto the
    /// earth-frame down direction.
    ///
    /// Called once before entering the running phase, with the accelerometer
    /// mean collected at startup. A degenerate measurement leaves the
    /// identity seed in place.
    pub fn seed_from_gravity(&mut self, accel: Vector3<f32>) {
        let seed = alignment(self.corrector.gravity_earth(), accel);
        self.predictor.reseed(seed);
        self.seeded = true;
    }

    /// Run one estimation cycle.
    pub fn update(&mut self, input: &CycleInput) -> AttitudeEstimate {
        let mut quality = EstimateQuality::empty();
        if self.seeded {
            quality |= EstimateQuality::SEEDED;
        }

        let predicted = match input.gyro {
            Some(sample) => {
                quality |= EstimateQuality::RATE_FRESH;
                self.predictor.integrate(sample.rate, sample.delta)
            }
            None => self.predictor.attitude(),
        };

        if let Some(accel) = input.accel {
            self.tilt = self.corrector.tilt_correction(accel, &predicted);
            quality |= EstimateQuality::TILT_FRESH;
        }
        if let Some(mag) = input.mag {
            self.heading = self.corrector.heading_correction(mag, &predicted);
            quality |= EstimateQuality::HEADING_FRESH;
        }

        let fused = self.fuser.fuse(predicted, self.tilt, self.heading);

        // The next integration step starts from the published estimate.
        self.predictor.reseed(fused);

        AttitudeEstimate {
            attitude: fused,
            quality,
        }
    }

    /// Current attitude without advancing the cycle.
    pub fn attitude(&self) -> UnitQuaternion<f32> {
        self.predictor.attitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK_HZ: f32 = 1000.0;

    fn estimator() -> AttitudeEstimator {
        let reference = MagReference::new(Vector3::new(0.22, 0.0, 0.41)).unwrap();
        AttitudeEstimator::new(
            &reference,
            EstimatorConfig {
                tick_hz: TICK_HZ,
                fuser: FuserConfig::default(),
            },
        )
    }

    fn gyro(rate: Vector3<f32>, ticks: u8) -> Option<GyroSample> {
        Some(GyroSample {
            rate,
            delta: TickDelta::between(0, ticks),
        })
    }

    #[test]
    fn test_unit_norm_over_mixed_cycles() {
        let mut est = estimator();

        for i in 0..5000u32 {
            let input = CycleInput {
                gyro: gyro(Vector3::new(0.3, -0.8, 1.1), 20),
                accel: (i % 3 == 0).then(|| Vector3::new(0.1, -0.2, 9.7)),
                mag: (i % 7 == 0).then(|| Vector3::new(0.2, 0.05, 0.4)),
            };
            let estimate = est.update(&input);
            let norm = estimate.attitude.into_inner().norm();
            assert!((norm - 1.0).abs() < 1e-4, "norm {} at cycle {}", norm, i);
        }
    }

    #[test]
    fn test_not_ready_sensors_reuse_stale_corrections() {
        let mut est = estimator();

        // A cycle with every sensor present computes fresh corrections.
        let full = CycleInput {
            gyro: gyro(Vector3::zeros(), 10),
            accel: Some(Vector3::new(0.5, 0.0, 9.6)),
            mag: Some(Vector3::new(0.3, 0.1, 0.3)),
        };
        let estimate = est.update(&full);
        assert!(estimate
            .quality
            .contains(EstimateQuality::TILT_FRESH | EstimateQuality::HEADING_FRESH));

        // Gyro-only cycle: corrections are stale but still applied, so the
        // attitude keeps creeping toward agreement even with zero rate.
        let before = est.attitude();
        let gyro_only = CycleInput {
            gyro: gyro(Vector3::zeros(), 10),
            accel: None,
            mag: None,
        };
        let estimate = est.update(&gyro_only);
        assert!(!estimate.quality.contains(EstimateQuality::TILT_FRESH));
        assert!(!estimate.quality.contains(EstimateQuality::HEADING_FRESH));
        assert!(estimate.attitude.angle_to(&before) > 0.0);
    }

    #[test]
    fn test_empty_cycle_still_publishes() {
        let mut est = estimator();
        let estimate = est.update(&CycleInput::default());

        assert!(!estimate.quality.contains(EstimateQuality::RATE_FRESH));
        assert!((estimate.attitude.into_inner().norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tilt_converges_to_measured_gravity() {
        let mut est = estimator();

        // Body rolled by 0.2 rad; the accelerometer reports gravity rotated
        // accordingly, the gyro reports no motion.
        let truth = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2);
        let measured_gravity = truth * (Vector3::z_axis().into_inner() * 9.81);

        for _ in 0..600 {
            est.update(&CycleInput {
                gyro: gyro(Vector3::zeros(), 10),
                accel: Some(measured_gravity),
                mag: None,
            });
        }

        let estimated_gravity = est.attitude() * Vector3::z_axis().into_inner();
        assert!((estimated_gravity - measured_gravity.normalize()).norm() < 1e-2);
    }

    #[test]
    fn test_seed_from_gravity_aligns_initial_attitude() {
        let mut est = estimator();

        let truth = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.4);
        let measured_gravity = truth * (Vector3::z_axis().into_inner() * 9.81);
        est.seed_from_gravity(measured_gravity);

        let estimated_gravity = est.attitude() * Vector3::z_axis().into_inner();
        assert!((estimated_gravity - measured_gravity.normalize()).norm() < 1e-4);

        let estimate = est.update(&CycleInput::default());
        assert!(estimate.quality.contains(EstimateQuality::SEEDED));
    }

    #[test]
    fn test_estimate_never_rolls_back_on_sensor_dropout() {
        let mut est = estimator();

        let moving = CycleInput {
            gyro: gyro(Vector3::new(0.0, 0.0, 1.0), 50),
            accel: None,
            mag: None,
        };
        est.update(&moving);
        let after_motion = est.attitude();

        // Dropping every sensor holds the estimate (identity corrections
        // were never computed, stale ones are identity).
        let estimate = est.update(&CycleInput::default());
        assert!(estimate.attitude.angle_to(&after_motion) < 1e-5);
    }
}
