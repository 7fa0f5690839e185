//! Calibration arithmetic.
//!
//! Two products come out of the one-shot startup calibration:
//!
//! - **Axis scales**: per-axis gain-equalization factors for the
//!   magnetometer, derived from the peak per-axis response observed while
//!   the device drives its self-test bias field.
//! - **Magnetic reference**: the local field vector (and its norm) that the
//!   heading corrector compares measurements against, derived from a window
//!   of scaled steady-state samples.
//!
//! The sampling procedures live in the firmware crate; this module is the
//! arithmetic over the collected samples.

use nalgebra::Vector3;

/// Number of readings taken per calibration sampling window.
pub const CAL_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// A per-axis maximum of zero: sensor saturated low or disconnected.
    /// The scale factor would be undefined.
    DegenerateAxis,
    /// The averaged reference field has (near-)zero norm.
    DegenerateReference,
    /// A sensor never reported ready within the polling budget.
    SensorTimeout,
}

/// Per-axis peak magnitudes over a sample window.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisMaxima {
    x: f32,
    y: f32,
    z: f32,
}

impl AxisMaxima {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the per-axis maxima.
    pub fn observe(&mut self, sample: Vector3<f32>) {
        self.x = self.x.max(sample.x.abs());
        self.y = self.y.max(sample.y.abs());
        self.z = self.z.max(sample.z.abs());
    }

    /// Largest of the three per-axis maxima.
    pub fn overall(&self) -> f32 {
        self.x.max(self.y).max(self.z)
    }
}

/// Gain-equalization factors, one per magnetometer axis.
///
/// Applied multiplicatively to raw readings so every axis reports the same
/// magnitude for the same field strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScales {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisScales {
    /// Unit scales, used until a calibration has run.
    pub fn identity() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }

    /// Derive the scales from a window's per-axis maxima.
    ///
    /// Each scale is `overall_max / axis_max`; the axis with the strongest
    /// response scales by exactly 1. An axis that never left zero makes the
    /// quotient undefined and fails the calibration instead.
    pub fn derive(maxima: &AxisMaxima) -> Result<Self, CalibrationError> {
        if maxima.x <= 0.0 || maxima.y <= 0.0 || maxima.z <= 0.0 {
            return Err(CalibrationError::DegenerateAxis);
        }

        let overall = maxima.overall();
        Ok(Self {
            x: overall / maxima.x,
            y: overall / maxima.y,
            z: overall / maxima.z,
        })
    }

    /// Apply the scales to a raw reading, component-wise.
    pub fn apply(&self, raw: Vector3<f32>) -> Vector3<f32> {
        Vector3::new(raw.x * self.x, raw.y * self.y, raw.z * self.z)
    }
}

/// Component-wise mean of a sample window.
pub fn mean(samples: &[Vector3<f32>]) -> Vector3<f32> {
    if samples.is_empty() {
        return Vector3::zeros();
    }

    let sum = samples
        .iter()
        .fold(Vector3::zeros(), |acc, sample| acc + sample);
    sum / (samples.len() as f32)
}
