//! Euler angle extraction from the attitude quaternion.
//!
//! Pure derived read for display and telemetry; nothing in the estimation
//! pipeline consumes these angles.

use nalgebra::UnitQuaternion;

/// Roll/pitch/yaw in radians, ZYX convention.
///
/// - Roll: rotation about X
/// - Pitch: rotation about Y
/// - Yaw: rotation about Z (heading)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl EulerAngles {
    pub fn from_quaternion(q: &UnitQuaternion<f32>) -> Self {
        let (w, x, y, z) = {
            let inner = q.into_inner();
            (inner.w, inner.i, inner.j, inner.k)
        };

        let roll = libm::atan2f(2.0 * (w * x + y * z), 1.0 - 2.0 * (x * x + y * y));
        // Clamp against rounding just outside [-1, 1] at gimbal lock.
        let pitch = libm::asinf((2.0 * (w * y - z * x)).clamp(-1.0, 1.0));
        let yaw = libm::atan2f(2.0 * (w * z + x * y), 1.0 - 2.0 * (y * y + z * z));

        Self { roll, pitch, yaw }
    }

    pub fn roll_deg(&self) -> f32 {
        self.roll.to_degrees()
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch.to_degrees()
    }

    pub fn yaw_deg(&self) -> f32 {
        self.yaw.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;
    use nalgebra::Vector3;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_identity_has_zero_angles() {
        let angles = EulerAngles::from_quaternion(&UnitQuaternion::identity());
        assert!(angles.roll.abs() < EPSILON);
        assert!(angles.pitch.abs() < EPSILON);
        assert!(angles.yaw.abs() < EPSILON);
    }

    #[test]
    fn test_pure_rotations_recovered() {
        let roll = EulerAngles::from_quaternion(&UnitQuaternion::from_axis_angle(
            &Vector3::x_axis(),
            0.5,
        ));
        assert!((roll.roll - 0.5).abs() < EPSILON);
        assert!(roll.pitch.abs() < EPSILON);
        assert!(roll.yaw.abs() < EPSILON);

        let pitch = EulerAngles::from_quaternion(&UnitQuaternion::from_axis_angle(
            &Vector3::y_axis(),
            -0.3,
        ));
        assert!((pitch.pitch + 0.3).abs() < EPSILON);

        let yaw = EulerAngles::from_quaternion(&UnitQuaternion::from_axis_angle(
            &Vector3::z_axis(),
            1.2,
        ));
        assert!((yaw.yaw - 1.2).abs() < EPSILON);
    }

    #[test]
    fn test_matches_composed_euler_construction() {
        let q = UnitQuaternion::from_euler_angles(0.2, -0.4, 0.9);
        let angles = EulerAngles::from_quaternion(&q);

        assert!((angles.roll - 0.2).abs() < EPSILON);
        assert!((angles.pitch + 0.4).abs() < EPSILON);
        assert!((angles.yaw - 0.9).abs() < EPSILON);
    }

    #[test]
    fn test_gimbal_lock_does_not_produce_nan() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        let angles = EulerAngles::from_quaternion(&q);

        assert!((angles.pitch - FRAC_PI_2).abs() < 1e-3);
        assert!(angles.roll.is_finite());
        assert!(angles.yaw.is_finite());
    }

    #[test]
    fn test_degree_conversions() {
        let angles = EulerAngles {
            roll: FRAC_PI_2,
            pitch: 0.0,
            yaw: -FRAC_PI_2,
        };
        assert!((angles.roll_deg() - 90.0).abs() < 1e-3);
        assert!((angles.yaw_deg() + 90.0).abs() < 1e-3);
    }
}
