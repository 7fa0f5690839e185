//! One-shot startup calibration procedure.
//!
//! Blocking by design: this runs before the real-time loop starts, and every
//! sampling step polls the sensor's ready flag under a bounded retry budget
//! so a dead sensor fails the calibration instead of hanging startup.

use heapless::Vec;
use nalgebra::Vector3;
use oarsense_core::ahrs::{
    calibration::{mean, AxisMaxima, CalibrationError},
    AxisScales, MagReference, CAL_SAMPLES,
};

use super::EstimatorError;
use crate::devices::{Accelerometer, Magnetometer};
use crate::platform::traits::I2cBus;
use crate::{log_debug, log_info};

/// Ready-flag polls allowed per sample before the sensor is declared dead.
pub const READY_RETRIES: u32 = 10_000;

/// Derive the per-axis gain-equalization scales and install them in the
/// magnetometer driver.
///
/// Runs the device's positive-bias self-test for [`CAL_SAMPLES`] readings
/// and keeps the per-axis peak response. The device is left back in normal
/// single-conversion mode, ready for steady-state sampling.
pub fn equalize_gains<B: I2cBus>(
    bus: &mut B,
    mag: &mut Magnetometer,
) -> Result<AxisScales, EstimatorError> {
    mag.enter_self_test(bus)?;

    let mut maxima = AxisMaxima::new();
    for _ in 0..CAL_SAMPLES {
        wait_ready(|| mag.data_ready(bus))?;
        maxima.observe(mag.read_raw(bus)?);
    }

    mag.leave_self_test(bus)?;

    let scales = AxisScales::derive(&maxima)?;
    mag.set_scales(scales);
    log_debug!(
        "mag gain scales: x={} y={} z={}",
        scales.x,
        scales.y,
        scales.z
    );
    Ok(scales)
}

/// Derive the magnetic reference from a window of scaled steady-field
/// readings.
///
/// The pod must sit still in a clean field while this runs. Requires the
/// gain scales to be installed first.
pub fn derive_reference<B: I2cBus>(
    bus: &mut B,
    mag: &mut Magnetometer,
) -> Result<MagReference, EstimatorError> {
    let mut window: Vec<Vector3<f32>, CAL_SAMPLES> = Vec::new();
    for _ in 0..CAL_SAMPLES {
        wait_ready(|| mag.data_ready(bus))?;
        let _ = window.push(mag.read(bus)?);
    }

    let reference = MagReference::from_samples(&window)?;
    log_info!("magnetic reference norm: {} gauss", reference.norm());
    Ok(reference)
}

/// Mean gravity vector over a window of accelerometer readings.
pub fn gravity_window<B: I2cBus>(
    bus: &mut B,
    accel: &mut Accelerometer,
) -> Result<Vector3<f32>, EstimatorError> {
    let mut window: Vec<Vector3<f32>, CAL_SAMPLES> = Vec::new();
    for _ in 0..CAL_SAMPLES {
        wait_ready(|| accel.data_ready(bus))?;
        let _ = window.push(accel.read(bus)?);
    }
    Ok(mean(&window))
}

fn wait_ready<F>(mut poll: F) -> Result<(), EstimatorError>
where
    F: FnMut() -> crate::platform::Result<bool>,
{
    for _ in 0..READY_RETRIES {
        if poll()? {
            return Ok(());
        }
    }
    Err(EstimatorError::Calibration(CalibrationError::SensorTimeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockI2c;
    use oarsense_core::ahrs::EstimatorConfig;

    fn queue_mag_sample(bus: &mut MockI2c, x: i16, y: i16, z: i16) {
        bus.queue_read_data(&[0x01]); // status: ready
        let (xb, yb, zb) = (x.to_be_bytes(), y.to_be_bytes(), z.to_be_bytes());
        bus.queue_read_data(&[xb[0], xb[1], yb[0], yb[1], zb[0], zb[1]]);
    }

    fn queue_accel_sample(bus: &mut MockI2c, x: i16, y: i16, z: i16) {
        bus.queue_read_data(&[0x80]); // INT_SOURCE: data ready
        let (xb, yb, zb) = (x.to_le_bytes(), y.to_le_bytes(), z.to_le_bytes());
        bus.queue_read_data(&[xb[0], xb[1], yb[0], yb[1], zb[0], zb[1]]);
    }

    #[test]
    fn test_equalize_gains_from_peak_response() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        // Peaks per axis over the window: x=100, y=80, z=120.
        queue_mag_sample(&mut bus, 100, 40, 90);
        queue_mag_sample(&mut bus, 70, 80, 120);
        for _ in 2..CAL_SAMPLES {
            queue_mag_sample(&mut bus, 60, 50, 100);
        }

        let scales = equalize_gains(&mut bus, &mut mag).unwrap();

        assert!((scales.x - 1.2).abs() < 1e-6);
        assert!((scales.y - 1.5).abs() < 1e-6);
        assert!((scales.z - 1.0).abs() < 1e-6);
        // Installed in the driver too.
        assert!((mag.scales().y - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_dead_axis_fails_calibration() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        for _ in 0..CAL_SAMPLES {
            queue_mag_sample(&mut bus, 100, 0, 120);
        }

        assert_eq!(
            equalize_gains(&mut bus, &mut mag),
            Err(EstimatorError::Calibration(CalibrationError::DegenerateAxis))
        );
    }

    #[test]
    fn test_silent_sensor_times_out() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        // No ready bytes queued: status polls read back zero forever.
        assert_eq!(
            equalize_gains(&mut bus, &mut mag),
            Err(EstimatorError::Calibration(CalibrationError::SensorTimeout))
        );
    }

    #[test]
    fn test_reference_is_mean_of_scaled_window() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        // Identity scales, gain 1300 LSB/gauss: 1300 counts = 1 gauss.
        for _ in 0..CAL_SAMPLES {
            queue_mag_sample(&mut bus, 1300, 0, 2600);
        }

        let reference = derive_reference(&mut bus, &mut mag).unwrap();

        assert!((reference.vector().x - 1.0).abs() < 1e-5);
        assert!(reference.vector().y.abs() < 1e-6);
        assert!((reference.vector().z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_field_rejected() {
        let mut bus = MockI2c::new();
        let mut mag = Magnetometer::new();

        for _ in 0..CAL_SAMPLES {
            queue_mag_sample(&mut bus, 0, 0, 0);
        }

        assert_eq!(
            derive_reference(&mut bus, &mut mag),
            Err(EstimatorError::Calibration(
                CalibrationError::DegenerateReference
            ))
        );
    }

    #[test]
    fn test_gravity_window_averages() {
        let mut bus = MockI2c::new();
        let mut accel = Accelerometer::new();

        for i in 0..CAL_SAMPLES as i16 {
            queue_accel_sample(&mut bus, 0, 0, 250 + i);
        }

        let gravity = gravity_window(&mut bus, &mut accel).unwrap();

        assert!(gravity.z > 9.0 && gravity.z < 10.5);
        assert!(gravity.x.abs() < 1e-6);
    }

    #[test]
    fn test_products_feed_estimator() {
        // The calibration products plug straight into the core estimator.
        let reference = MagReference::new(Vector3::new(0.3, 0.0, 0.4)).unwrap();
        let gravity = Vector3::new(0.0, 0.0, 9.81);

        let mut estimator =
            oarsense_core::ahrs::AttitudeEstimator::new(&reference, EstimatorConfig::default());
        estimator.seed_from_gravity(gravity);
        let estimate = estimator.update(&Default::default());
        assert!((estimate.attitude.into_inner().norm() - 1.0).abs() < 1e-5);
    }
}
