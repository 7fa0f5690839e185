//! oarsense-firmware - Platform layer and estimation tasks for the oarsense
//! attitude sensor pod
//!
//! The pure fusion algorithms live in `oarsense-core`; this crate provides
//! everything between them and the hardware:
//!
//! - [`platform`]: Hardware abstraction traits (I2C, UART, non-volatile
//!   storage, tick counter) with a mock implementation for host tests
//! - [`devices`]: Sensor drivers written against the platform traits
//! - [`estimator`]: Startup calibration, the cycle driver and the shared
//!   published estimate
//! - [`telemetry`]: Attitude frame export over the serial link
//!
//! All code is host-testable: unit tests run against the mock platform with
//! no hardware or feature flags.

#![cfg_attr(not(test), no_std)]

pub mod devices;
pub mod estimator;
pub mod logging;
pub mod platform;
pub mod telemetry;
