//! Sensor drivers.
//!
//! Each driver is written against [`crate::platform::traits::I2cBus`] and
//! returns already-scaled physical units; register maps and raw-to-physical
//! conversion never leak above this module. Every driver exposes the same
//! polling shape: a non-blocking ready check and a typed read.

pub mod accelerometer;
pub mod gyroscope;
pub mod magnetometer;

pub use accelerometer::Accelerometer;
pub use gyroscope::{GyroReading, Gyroscope};
pub use magnetometer::Magnetometer;
