//! Vector-alignment corrections.
//!
//! Each correction compares a measured body-frame direction against the
//! direction the current attitude says we should be measuring (the reference
//! vector rotated into the body frame), and produces the minimal rotation
//! that brings the two into agreement. Applied on the body side of the
//! attitude, a full-strength correction would make the expected direction
//! coincide with the measurement; the fuser applies only a small fraction of
//! it per cycle.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use super::reference::MagReference;

/// Measured vectors shorter than this are treated as a sensor fault and
/// produce the identity correction.
pub const MIN_VECTOR_NORM: f32 = 1e-6;

const ANTIPARALLEL_DOT: f32 = -0.999_999;

/// Minimal rotation taking the direction of `from` onto the direction of
/// `to`.
///
/// Degenerate inputs (either vector near zero) yield the identity rather
/// than an undefined rotation axis. Antiparallel inputs rotate half a turn
/// about a deterministically chosen orthogonal axis.
pub fn alignment(from: Vector3<f32>, to: Vector3<f32>) -> UnitQuaternion<f32> {
    let (f, t) = match (unit(from), unit(to)) {
        (Some(f), Some(t)) => (f, t),
        _ => return UnitQuaternion::identity(),
    };

    let dot = f.dot(&t);
    if dot < ANTIPARALLEL_DOT {
        let axis = orthogonal_to(f);
        return UnitQuaternion::from_quaternion(Quaternion::new(0.0, axis.x, axis.y, axis.z));
    }

    // Half-angle form of the shortest arc: no trigonometry needed.
    let cross = f.cross(&t);
    UnitQuaternion::from_quaternion(Quaternion::new(1.0 + dot, cross.x, cross.y, cross.z))
}

fn unit(v: Vector3<f32>) -> Option<Vector3<f32>> {
    v.try_normalize(MIN_VECTOR_NORM)
}

/// Any unit vector orthogonal to `v` (which must itself be unit length).
fn orthogonal_to(v: Vector3<f32>) -> Vector3<f32> {
    let candidate = if v.x.abs() < 0.9 {
        Vector3::x_axis().into_inner()
    } else {
        Vector3::y_axis().into_inner()
    };
    v.cross(&candidate).normalize()
}

/// Correction source for the fuser.
///
/// Owns the two earth-frame reference directions: gravity (fixed straight
/// down) and the calibrated local magnetic field.
pub struct VectorCorrector {
    gravity_earth: Vector3<f32>,
    mag_earth: Vector3<f32>,
}

impl VectorCorrector {
    pub fn new(reference: &MagReference) -> Self {
        Self {
            gravity_earth: Vector3::z_axis().into_inner(),
            mag_earth: reference.direction(),
        }
    }

    /// Earth-frame gravity direction used as the tilt reference.
    pub fn gravity_earth(&self) -> Vector3<f32> {
        self.gravity_earth
    }

    /// Tilt correction from an accelerometer reading.
    ///
    /// Rotates the gravity reference into the body frame through `attitude`
    /// and aligns the expected direction with the measured one. A near-zero
    /// measurement yields the identity.
    pub fn tilt_correction(
        &self,
        measured: Vector3<f32>,
        attitude: &UnitQuaternion<f32>,
    ) -> UnitQuaternion<f32> {
        let expected = attitude * self.gravity_earth;
        alignment(expected, measured)
    }

    /// Heading correction from a magnetometer reading.
    ///
    /// Both the measured field and the expected (rotated-reference) field are
    /// first projected onto the plane orthogonal to the body-frame vertical,
    /// so the resulting rotation is purely about the vertical axis and cannot
    /// disturb roll/pitch already resolved by the tilt correction.
    pub fn heading_correction(
        &self,
        measured: Vector3<f32>,
        attitude: &UnitQuaternion<f32>,
    ) -> UnitQuaternion<f32> {
        let expected = attitude * self.mag_earth;
        let down = attitude * self.gravity_earth;

        let measured_h = horizontal(measured, down);
        let expected_h = horizontal(expected, down);

        alignment(expected_h, measured_h)
    }
}

/// Component of `v` orthogonal to the (unit) `down` axis.
fn horizontal(v: Vector3<f32>, down: Vector3<f32>) -> Vector3<f32> {
    v - down * v.dot(&down)
}
