//! Complementary blending of prediction and corrections.
//!
//! The gyroscope prediction is smooth but drifts; the vector-alignment
//! corrections are drift-free but noisy. Each cycle the fuser applies a small
//! fraction of each correction to the predicted attitude: the tilt
//! correction first (resolving roll/pitch), then the heading correction
//! (resolving yaw about the vertical), then one renormalization before the
//! estimate is published.

use nalgebra::{Quaternion, UnitQuaternion};

/// Per-channel trust weights.
///
/// A weight close to 1 trusts the correction (stable but noisy); close to 0
/// trusts the integration (smooth but drifting). The defaults are tuned for
/// a 50 Hz cycle, not derived from sensor covariance.
#[derive(Debug, Clone, Copy)]
pub struct FuserConfig {
    /// Trust weight for the accelerometer (tilt) correction, in (0, 1).
    pub tilt_alpha: f32,
    /// Trust weight for the magnetometer (heading) correction, in (0, 1).
    pub heading_alpha: f32,
}

impl Default for FuserConfig {
    fn default() -> Self {
        Self {
            tilt_alpha: 0.04,
            heading_alpha: 0.02,
        }
    }
}

pub struct Fuser {
    config: FuserConfig,
}

impl Fuser {
    pub fn new(config: FuserConfig) -> Self {
        Self { config }
    }

    /// Blend one cycle's prediction and corrections into the published
    /// attitude.
    ///
    /// Corrections are full-strength alignment rotations; the configured
    /// weights shrink them toward the identity before they are composed onto
    /// the prediction. Tilt composes innermost so the heading correction
    /// cannot reintroduce roll/pitch error.
    pub fn fuse(
        &self,
        predicted: UnitQuaternion<f32>,
        tilt: UnitQuaternion<f32>,
        heading: UnitQuaternion<f32>,
    ) -> UnitQuaternion<f32> {
        let tilt_step = scale_toward_identity(tilt, self.config.tilt_alpha);
        let heading_step = scale_toward_identity(heading, self.config.heading_alpha);

        let blended = heading_step * tilt_step * predicted.into_inner();

        // Single renormalization before publishing.
        UnitQuaternion::from_quaternion(blended)
    }
}

/// Linear blend between the identity and `q`, by weight `alpha`.
///
/// For the small correction angles seen in steady state this matches the
/// spherical interpolation to well below sensor noise. The sign of `q` is
/// canonicalized first so the blend takes the short way around.
fn scale_toward_identity(q: UnitQuaternion<f32>, alpha: f32) -> Quaternion<f32> {
    let mut inner = q.into_inner();
    if inner.w < 0.0 {
        inner = -inner;
    }

    Quaternion::new(
        (1.0 - alpha) + alpha * inner.w,
        alpha * inner.i,
        alpha * inner.j,
        alpha * inner.k,
    )
}
